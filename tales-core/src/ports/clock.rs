//! Clock port - source of "today" for daily quota rollover

use chrono::NaiveDate;

/// Wall-clock abstraction so day rollover can be tested
pub trait Clock: Send + Sync {
    /// Current calendar date (UTC)
    fn today(&self) -> NaiveDate;

    /// Current time in unix milliseconds
    fn now_ms(&self) -> i64;
}
