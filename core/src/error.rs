use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by the metrics aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MetricsError {
    /// A goal used as a progress denominator was zero or negative.
    #[error("invalid goal {goal}: goals must be greater than zero")]
    InvalidGoal { goal: i64 },

    #[error("window of {window_days} days is too long (at most {max})")]
    WindowTooLong { window_days: u32, max: u32 },

    /// The window would start before the earliest representable date.
    #[error("window of {window_days} days ending {today} starts before the earliest supported date")]
    WindowOutOfRange { today: NaiveDate, window_days: u32 },
}
