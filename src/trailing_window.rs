use chrono::{Datelike, NaiveDate, TimeDelta, Weekday};

use crate::structs::{ClosesResult, DailyCloseSeries};

/// Walks back from `reference` (exclusive) and returns `day_count` days,
/// newest first, with weekends pushed out by the compensator.
///
/// The weekday check runs on the candidate *before* the compensator is
/// bumped, and the bumped offset is then applied to the same iteration.
/// Counts are expected to stay within `config::MAX_DAY_COUNT`; a walk far
/// past chrono's minimum date panics.
pub fn trailing_business_days(reference: NaiveDate, day_count: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(day_count);
    let mut weekend_compensator: i64 = 0;
    for i in 1..=day_count as i64 {
        let candidate = reference - TimeDelta::days(i + weekend_compensator);
        match candidate.weekday() {
            Weekday::Sat => weekend_compensator += 1,
            Weekday::Sun => weekend_compensator += 2,
            _ => {}
        }
        days.push(reference - TimeDelta::days(i + weekend_compensator));
    }
    days
}

/// Collects the closes of the trailing window and averages them over
/// `day_count`. Days absent from `series` count as 0.0.
///
/// A `day_count` of zero divides zero by zero and yields NaN.
pub fn compute_closes(
    symbol: &str,
    reference: NaiveDate,
    day_count: usize,
    series: &DailyCloseSeries,
) -> ClosesResult {
    let mut cumulative_close = 0.0;
    let daily_closes: Vec<f64> = trailing_business_days(reference, day_count)
        .iter()
        .map(|day| {
            let close = series.close_on(day);
            cumulative_close += close;
            close
        })
        .collect();

    ClosesResult::new(
        symbol.to_string(),
        daily_closes,
        cumulative_close / day_count as f64,
    )
}

#[cfg(test)]
fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// 2024-05-27 is a Monday.

#[test]
pub fn test_monday_single_day_picks_prior_friday() {
    let series: DailyCloseSeries = [(ymd(2024, 5, 24), 100.0)].into_iter().collect();
    let result = compute_closes("NVDA", ymd(2024, 5, 27), 1, &series);
    assert_eq!(result.symbol(), "NVDA");
    assert_eq!(result.daily_closes(), &[100.0]);
    assert_eq!(result.average_close(), 100.0);
}

#[test]
pub fn test_monday_full_week_average() {
    let series: DailyCloseSeries = [
        (ymd(2024, 5, 24), 10.0),
        (ymd(2024, 5, 23), 20.0),
        (ymd(2024, 5, 22), 30.0),
        (ymd(2024, 5, 21), 40.0),
        (ymd(2024, 5, 20), 50.0),
    ]
    .into_iter()
    .collect();
    let result = compute_closes("NVDA", ymd(2024, 5, 27), 5, &series);
    assert_eq!(result.daily_closes(), &[10.0, 20.0, 30.0, 40.0, 50.0]);
    assert_eq!(result.average_close(), 30.0);
}

#[test]
pub fn test_empty_series_is_all_zero() {
    let result = compute_closes("NVDA", ymd(2024, 5, 29), 3, &DailyCloseSeries::default());
    assert_eq!(result.daily_closes(), &[0.0, 0.0, 0.0]);
    assert_eq!(result.average_close(), 0.0);
}

#[test]
pub fn test_missing_days_dilute_average() {
    // Wednesday reference: Tue, Mon, then Fri after the weekend jump.
    let series: DailyCloseSeries = [(ymd(2024, 5, 28), 30.0), (ymd(2024, 5, 24), 60.0)]
        .into_iter()
        .collect();
    let result = compute_closes("NVDA", ymd(2024, 5, 29), 3, &series);
    assert_eq!(result.daily_closes(), &[30.0, 0.0, 60.0]);
    assert_eq!(result.average_close(), 30.0);
}

#[test]
pub fn test_zero_day_count_is_nan() {
    let result = compute_closes("NVDA", ymd(2024, 5, 27), 0, &DailyCloseSeries::default());
    assert!(result.daily_closes().is_empty());
    assert!(result.average_close().is_nan());
}

#[test]
pub fn test_walk_spans_two_weekends() {
    let days = trailing_business_days(ymd(2024, 5, 27), 10);
    assert_eq!(
        days,
        vec![
            ymd(2024, 5, 24),
            ymd(2024, 5, 23),
            ymd(2024, 5, 22),
            ymd(2024, 5, 21),
            ymd(2024, 5, 20),
            ymd(2024, 5, 17),
            ymd(2024, 5, 16),
            ymd(2024, 5, 15),
            ymd(2024, 5, 14),
            ymd(2024, 5, 13),
        ]
    );
}

#[test]
pub fn test_weekend_reference_steps_back_to_friday() {
    // Saturday and Sunday references both land on the same Friday first.
    assert_eq!(trailing_business_days(ymd(2024, 5, 25), 1), vec![ymd(2024, 5, 24)]);
    assert_eq!(trailing_business_days(ymd(2024, 5, 26), 2), vec![ymd(2024, 5, 24), ymd(2024, 5, 23)]);
}

#[test]
pub fn test_largest_configured_window_stays_in_range() {
    let days = trailing_business_days(ymd(2024, 5, 27), crate::config::MAX_DAY_COUNT);
    assert_eq!(days.len(), crate::config::MAX_DAY_COUNT);
    assert!(days.iter().all(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)));
}
