//! Data model: periods, candidates, ranked entries and exported records.

pub mod period;
pub mod types;

pub use period::Period;
pub use types::{Candidate, MonthTarget, RankedEntry, RankingKind, SalesEntry, SalesRecord, SortPolicy};
