use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{de::{MapAccess, Visitor}, Deserialize, Deserializer};

use crate::error::UpstreamError;
use crate::structs::DailyCloseSeries;

/*
{
  "Meta Data": {
    "1. Information": "Daily Time Series with Splits and Dividend Events",
    "2. Symbol": "IBM",
    "3. Last Refreshed": "2024-05-28",
    "4. Output Size": "Compact",
    "5. Time Zone": "US/Eastern"
  },
  "Time Series (Daily)": {
    "2024-05-28": {
      "1. open": "170.4400",
      "2. high": "171.0850",
      "3. low": "168.6500",
      "4. close": "169.6600",
      "5. adjusted close": "169.6600",
      "6. volume": "2958701",
      "7. dividend amount": "0.0000",
      "8. split coefficient": "1.0"
    },
    ...
*/
#[derive(Deserialize, Debug)]
pub struct DailyAdjustedResponse {
    #[serde(rename = "Time Series (Daily)", default)]
    time_series: Option<DailyCloseMap>,
    #[serde(rename = "Error Message", default)]
    error_message: Option<String>,
    #[serde(rename = "Note", default)]
    note: Option<String>,
    #[serde(rename = "Information", default)]
    information: Option<String>,
}

impl DailyAdjustedResponse {
    /// The close series, or the provider's own explanation of why there is none.
    pub fn into_series(self) -> Result<DailyCloseSeries, UpstreamError> {
        match self.time_series {
            Some(series) => Ok(DailyCloseSeries::new(series.map)),
            None => Err(UpstreamError::Provider(
                self.error_message
                    .or(self.note)
                    .or(self.information)
                    .unwrap_or_else(|| "response has no daily time series".to_string()),
            )),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct DailyCloseMap {
    #[serde(flatten, deserialize_with = "deserialize_close_map")]
    map: HashMap<NaiveDate, f64>,
}

#[derive(Deserialize, Debug)]
struct DailyBar {
    #[serde(rename = "4. close")]
    close: String,
}

pub const FORMAT: &str = "%Y-%m-%d";

fn deserialize_close_map<'de, D>(deserializer: D) -> Result<HashMap<NaiveDate, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct MapVisitor;

    impl<'de> Visitor<'de> for MapVisitor {
        type Value = HashMap<NaiveDate, f64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("map should contain dates and daily bar data")
        }

        fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
        where
            M: MapAccess<'de>,
        {
            let mut result = HashMap::new();
            while let Some((key, bar)) = map.next_entry::<String, DailyBar>()? {
                let day = NaiveDate::parse_from_str(&key, FORMAT).map_err(serde::de::Error::custom)?;
                let close = bar.close.trim().parse::<f64>().map_err(|e| {
                    serde::de::Error::custom(format!("close '{}' on {key}: {e}", bar.close))
                })?;
                result.insert(day, close);
            }
            Ok(result)
        }
    }

    deserializer.deserialize_map(MapVisitor)
}

/// Decodes a raw `TIME_SERIES_DAILY_ADJUSTED` body.
pub fn parse_daily_series(body: &[u8]) -> Result<DailyCloseSeries, UpstreamError> {
    let response: DailyAdjustedResponse = serde_json::from_slice(body)?;
    response.into_series()
}

/// Thin client for the Alpha Vantage query endpoint.
#[derive(Clone, Debug)]
pub struct AlphaVantageClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    /// `GET {base_url}/query` with the key and symbol as encoded query parameters.
    pub fn daily_series_request(&self, symbol: &str) -> reqwest::RequestBuilder {
        self.http.get(format!("{}/query", self.base_url)).query(&[
            ("apikey", self.api_key.as_str()),
            ("function", "TIME_SERIES_DAILY_ADJUSTED"),
            ("symbol", symbol),
        ])
    }

    /// One GET, no retries.
    pub async fn fetch_daily_series(&self, symbol: &str) -> Result<DailyCloseSeries, UpstreamError> {
        let response = self.daily_series_request(symbol).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }
        let body = response.bytes().await?;
        let series = parse_daily_series(&body)?;
        tracing::debug!("fetched {} daily closes for {symbol}", series.len());
        Ok(series)
    }
}

#[test]
pub fn test_str_gets_deserialized_properly() {
    let json_str = r#"
    {
        "Meta Data": {
            "1. Information": "Daily Time Series with Splits and Dividend Events",
            "2. Symbol": "IBM",
            "3. Last Refreshed": "2024-05-28",
            "4. Output Size": "Compact",
            "5. Time Zone": "US/Eastern"
        },
        "Time Series (Daily)": {
            "2024-05-28": {
                "1. open": "170.4400",
                "2. high": "171.0850",
                "3. low": "168.6500",
                "4. close": "169.6600",
                "5. adjusted close": "169.6600",
                "6. volume": "2958701",
                "7. dividend amount": "0.0000",
                "8. split coefficient": "1.0"
            },
            "2024-05-24": {
                "1. open": "170.4000",
                "2. high": "171.5000",
                "3. low": "169.9100",
                "4. close": "170.8900",
                "5. adjusted close": "170.8900",
                "6. volume": "2587785",
                "7. dividend amount": "0.0000",
                "8. split coefficient": "1.0"
            }
        }
    }
    "#;
    let series = parse_daily_series(json_str.as_bytes()).unwrap();
    assert_eq!(series.len(), 2);
    let day = NaiveDate::parse_from_str("2024-05-24", FORMAT).unwrap();
    assert_eq!(series.get(&day), Some(170.89));
}

#[test]
pub fn test_provider_error_message_is_surfaced() {
    let json_str = r#"{"Error Message": "Invalid API call. Please retry or visit the documentation."}"#;
    match parse_daily_series(json_str.as_bytes()) {
        Err(UpstreamError::Provider(msg)) => assert!(msg.starts_with("Invalid API call")),
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[test]
pub fn test_bad_close_is_decode_error() {
    let json_str = r#"{"Time Series (Daily)": {"2024-05-28": {"4. close": "n/a"}}}"#;
    assert!(matches!(
        parse_daily_series(json_str.as_bytes()),
        Err(UpstreamError::Decode(_))
    ));

    let json_str = r#"{"Time Series (Daily)": {"28/05/2024": {"4. close": "1.0"}}}"#;
    assert!(matches!(
        parse_daily_series(json_str.as_bytes()),
        Err(UpstreamError::Decode(_))
    ));
}

#[test]
pub fn test_query_parameters_are_encoded() {
    let client = AlphaVantageClient::new(
        "https://www.alphavantage.co".to_string(),
        "demo".to_string(),
        Duration::from_secs(1),
    )
    .unwrap();
    let request = client.daily_series_request("IBM").build().unwrap();
    assert_eq!(
        request.url().as_str(),
        "https://www.alphavantage.co/query?apikey=demo&function=TIME_SERIES_DAILY_ADJUSTED&symbol=IBM"
    );

    let request = client.daily_series_request("BRK B&x=1").build().unwrap();
    let symbol: Vec<_> = request
        .url()
        .query_pairs()
        .filter(|(k, _)| k == "symbol")
        .map(|(_, v)| v.into_owned())
        .collect();
    assert_eq!(symbol, vec!["BRK B&x=1".to_string()]);
    assert!(!request.url().query_pairs().any(|(k, _)| k == "x"));
}
