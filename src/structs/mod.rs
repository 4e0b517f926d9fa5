mod closes_result;
mod daily_close_series;

pub use closes_result::ClosesResult;
pub use daily_close_series::DailyCloseSeries;
