//! Multi-month aggregation.
//!
//! [`monthly::MonthlyAggregator`] walks the month targets one at a time,
//! pausing between requests through [`rate_limiter::RateLimiter`], and
//! merges the ranked months into one list ranked per period.

pub mod monthly;
pub mod rate_limiter;

pub use monthly::{MonthObserver, MonthOutcome, MonthReport, MonthlyAggregator, RunReport, DEFAULT_DELAY_MS};
pub use rate_limiter::RateLimiter;
