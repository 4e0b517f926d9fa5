use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_SECRET_FILE: &str = "/mnt/secrets/stockAPIKey";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_STOCK_API_ADDR: &str = "https://www.alphavantage.co";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
/// Upper bound for `NDAYS`, about forty years of trading days.
pub const MAX_DAY_COUNT: usize = 10_000;

/// Service configuration, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub symbol: String,
    /// Number of business days in the trailing window. Always > 0.
    pub day_count: usize,
    pub api_key: String,

    pub bind: SocketAddr,
    pub stock_api_addr: String,
    pub upstream_timeout: Duration,
}

fn lookup_str(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn require_str(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    lookup_str(lookup, name).ok_or(ConfigError::MissingEnv(name))
}

fn parse_env<T>(name: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidEnv {
        name,
        reason: e.to_string(),
        value,
    })
}

/// Parses `value` and checks it lies in `min..=max`.
fn parse_bounded<T>(name: &'static str, value: String, min: T, max: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    let parsed: T = parse_env(name, value.clone())?;
    if parsed < min || parsed > max {
        return Err(ConfigError::InvalidEnv {
            name,
            value,
            reason: format!("must be between {min} and {max}"),
        });
    }
    Ok(parsed)
}

/// Reads the API key from `path`. Surrounding whitespace is dropped.
pub fn require_secret_file(path: &Path) -> Result<String, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::SecretRead {
        path: path.to_path_buf(),
        source,
    })?;
    let secret = contents.trim();
    if secret.is_empty() {
        return Err(ConfigError::EmptySecret(path.to_path_buf()));
    }
    Ok(secret.to_string())
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let day_count = parse_bounded("NDAYS", require_str(&lookup, "NDAYS")?, 1, MAX_DAY_COUNT)?;
        let symbol = require_str(&lookup, "SYMBOL")?;

        let secret_file = lookup_str(&lookup, "STOCK_API_KEY_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SECRET_FILE));
        let api_key = require_secret_file(&secret_file)?;

        let bind = parse_env(
            "BIND_ADDR",
            lookup_str(&lookup, "BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        )?;
        let stock_api_addr = lookup_str(&lookup, "STOCK_API_ADDR")
            .unwrap_or_else(|| DEFAULT_STOCK_API_ADDR.to_string())
            .trim_end_matches('/')
            .to_string();
        let timeout_secs = match lookup_str(&lookup, "UPSTREAM_TIMEOUT_SECS") {
            Some(v) => parse_bounded("UPSTREAM_TIMEOUT_SECS", v, 1, u64::MAX)?,
            None => DEFAULT_UPSTREAM_TIMEOUT_SECS,
        };

        Ok(Self {
            symbol,
            day_count,
            api_key,
            bind,
            stock_api_addr,
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn secret_file(name: &str, contents: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("stock-closes-{}-{name}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn load(vars: &HashMap<String, String>) -> Result<ServiceConfig, ConfigError> {
        ServiceConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_loads_required_and_defaults() {
        let key = secret_file("ok", "demo-key\n");
        let cfg = load(&vars(&[
            ("NDAYS", "7"),
            ("SYMBOL", " MSFT "),
            ("STOCK_API_KEY_FILE", key.to_str().unwrap()),
        ]))
        .unwrap();
        assert_eq!(cfg.day_count, 7);
        assert_eq!(cfg.symbol, "MSFT");
        assert_eq!(cfg.api_key, "demo-key");
        assert_eq!(cfg.bind, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.stock_api_addr, DEFAULT_STOCK_API_ADDR);
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_optional_overrides() {
        let key = secret_file("overrides", "k");
        let cfg = load(&vars(&[
            ("NDAYS", "3"),
            ("SYMBOL", "IBM"),
            ("STOCK_API_KEY_FILE", key.to_str().unwrap()),
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("STOCK_API_ADDR", "http://localhost:1234/"),
            ("UPSTREAM_TIMEOUT_SECS", "2"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind.port(), 9000);
        assert_eq!(cfg.stock_api_addr, "http://localhost:1234");
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_missing_required_env() {
        let err = load(&vars(&[("SYMBOL", "IBM")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv("NDAYS")));

        let err = load(&vars(&[("NDAYS", "5"), ("SYMBOL", "   ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv("SYMBOL")));
    }

    #[test]
    fn test_rejects_bad_day_count() {
        for bad in ["abc", "-2", "0", "1.5"] {
            let err = load(&vars(&[("NDAYS", bad), ("SYMBOL", "IBM")])).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidEnv { name: "NDAYS", .. }),
                "NDAYS={bad} gave {err}"
            );
        }
    }

    #[test]
    fn test_rejects_day_count_out_of_range() {
        let too_many = (MAX_DAY_COUNT + 1).to_string();
        for bad in ["00", "+0", "100000000", too_many.as_str()] {
            match load(&vars(&[("NDAYS", bad), ("SYMBOL", "IBM")])) {
                Err(ConfigError::InvalidEnv { name, value, .. }) => {
                    assert_eq!(name, "NDAYS");
                    assert_eq!(value, bad);
                }
                other => panic!("NDAYS={bad} gave {other:?}"),
            }
        }
    }

    #[test]
    fn test_max_day_count_is_accepted() {
        let key = secret_file("max", "k");
        let max = MAX_DAY_COUNT.to_string();
        let cfg = load(&vars(&[
            ("NDAYS", max.as_str()),
            ("SYMBOL", "IBM"),
            ("STOCK_API_KEY_FILE", key.to_str().unwrap()),
        ]))
        .unwrap();
        assert_eq!(cfg.day_count, MAX_DAY_COUNT);
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let key = secret_file("zero-timeout", "k");
        let err = load(&vars(&[
            ("NDAYS", "3"),
            ("SYMBOL", "IBM"),
            ("STOCK_API_KEY_FILE", key.to_str().unwrap()),
            ("UPSTREAM_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv { name: "UPSTREAM_TIMEOUT_SECS", .. }
        ));
    }

    #[test]
    fn test_secret_file_errors() {
        let missing = env::temp_dir().join("stock-closes-does-not-exist");
        let err = load(&vars(&[
            ("NDAYS", "5"),
            ("SYMBOL", "IBM"),
            ("STOCK_API_KEY_FILE", missing.to_str().unwrap()),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::SecretRead { .. }));

        let empty = secret_file("empty", " \n");
        let err = load(&vars(&[
            ("NDAYS", "5"),
            ("SYMBOL", "IBM"),
            ("STOCK_API_KEY_FILE", empty.to_str().unwrap()),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptySecret(_)));
    }
}
