use serde::{Deserialize, Serialize};

/// Response body for a closes query.
///
/// Serializes as `{"stock": .., "data": [..], "averageClose": ..}`.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ClosesResult {
    #[serde(rename = "stock")]
    symbol: String,
    #[serde(rename = "data")]
    daily_closes: Vec<f64>,
    #[serde(rename = "averageClose")]
    average_close: f64,
}

impl ClosesResult {
    pub fn new(symbol: String, daily_closes: Vec<f64>, average_close: f64) -> Self {
        Self {
            symbol,
            daily_closes,
            average_close,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Newest first.
    pub fn daily_closes(&self) -> &[f64] {
        &self.daily_closes
    }

    pub fn average_close(&self) -> f64 {
        self.average_close
    }
}

#[test]
pub fn test_serializes_with_wire_field_names() {
    let result = ClosesResult::new("MSFT".to_string(), vec![10.0, 20.5], 15.25);
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "stock": "MSFT",
            "data": [10.0, 20.5],
            "averageClose": 15.25,
        })
    );
}
