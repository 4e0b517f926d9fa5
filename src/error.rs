use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Body returned to callers on any request failure. Details stay in the log.
pub const GENERIC_ERROR_BODY: &str = "There was an error processing your request";

/// Fatal startup errors. Any of these stops the process before it binds.
#[derive(Debug)]
pub enum ConfigError {
    MissingEnv(&'static str),
    InvalidEnv {
        name: &'static str,
        value: String,
        reason: String,
    },
    SecretRead {
        path: PathBuf,
        source: std::io::Error,
    },
    EmptySecret(PathBuf),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnv(name) => write!(f, "env '{name}' is required but not set"),
            Self::InvalidEnv {
                name,
                value,
                reason,
            } => write!(f, "env '{name}' has invalid value '{value}': {reason}"),
            Self::SecretRead { path, source } => write!(
                f,
                "error reading required secret from file ({}): {source}",
                path.display()
            ),
            Self::EmptySecret(path) => write!(
                f,
                "secrets file '{}' is required but has no content",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SecretRead { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failures talking to the price provider.
#[derive(Debug)]
pub enum UpstreamError {
    Request(reqwest::Error),
    Status(reqwest::StatusCode),
    Decode(serde_json::Error),
    /// The provider answered without a series, e.g. bad key or rate limit.
    Provider(String),
}

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(e) => write!(f, "upstream request failed: {e}"),
            Self::Status(status) => write!(f, "upstream returned status {status}"),
            Self::Decode(e) => write!(f, "error decoding upstream response: {e}"),
            Self::Provider(msg) => write!(f, "upstream reported: {msg}"),
        }
    }
}

impl std::error::Error for UpstreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(e) => Some(e),
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

// The request URL carries the API key, so it is stripped before the error
// can reach a log line.
impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e.without_url())
    }
}

impl From<serde_json::Error> for UpstreamError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e)
    }
}

/// Request-boundary error. Logs the cause and answers with a bare 500.
#[derive(Debug)]
pub enum ApiError {
    Upstream(UpstreamError),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upstream(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<UpstreamError> for ApiError {
    fn from(e: UpstreamError) -> Self {
        Self::Upstream(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("request failed: {self}");
        (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR_BODY).into_response()
    }
}

#[tokio::test]
pub async fn test_api_error_hides_detail() {
    let err = ApiError::from(UpstreamError::Provider("Invalid API call".to_string()));
    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert_eq!(text, GENERIC_ERROR_BODY);
    assert!(!text.contains("Invalid API call"));
}

#[test]
pub fn test_config_error_messages() {
    assert_eq!(
        ConfigError::MissingEnv("NDAYS").to_string(),
        "env 'NDAYS' is required but not set"
    );
    assert_eq!(
        ConfigError::EmptySecret(PathBuf::from("/mnt/secrets/stockAPIKey")).to_string(),
        "secrets file '/mnt/secrets/stockAPIKey' is required but has no content"
    );
}
