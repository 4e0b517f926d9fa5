use std::collections::HashMap;

use chrono::NaiveDate;

/// Closing prices keyed by trading day, as reported by the upstream provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyCloseSeries {
    closes: HashMap<NaiveDate, f64>,
}

impl DailyCloseSeries {
    pub fn new(closes: HashMap<NaiveDate, f64>) -> Self {
        Self { closes }
    }

    pub fn get(&self, day: &NaiveDate) -> Option<f64> {
        self.closes.get(day).copied()
    }

    /// Close for `day`, or 0.0 when the provider has no entry for it.
    pub fn close_on(&self, day: &NaiveDate) -> f64 {
        self.get(day).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

impl FromIterator<(NaiveDate, f64)> for DailyCloseSeries {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, f64)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[test]
pub fn test_missing_day_reads_as_zero() {
    let friday = NaiveDate::from_ymd_opt(2024, 5, 24).unwrap();
    let thursday = NaiveDate::from_ymd_opt(2024, 5, 23).unwrap();
    let series: DailyCloseSeries = [(friday, 101.5)].into_iter().collect();
    assert_eq!(series.len(), 1);
    assert_eq!(series.close_on(&friday), 101.5);
    assert_eq!(series.get(&thursday), None);
    assert_eq!(series.close_on(&thursday), 0.0);
}
