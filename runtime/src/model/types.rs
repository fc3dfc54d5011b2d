//! Records flowing through the extraction and ranking pipeline.

use crate::error::{Result, ScrapeError};
use crate::model::period::Period;
use serde::{Deserialize, Serialize};

/// Which ranking board is being scraped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RankingKind {
    /// Manufacturer brand ranking, read through the heuristic cascade.
    #[default]
    Brand,
    /// Vehicle model ranking, read through fixed row selectors.
    Model,
}

impl RankingKind {
    /// URL template for one month; `{period}` is replaced by `YYYY-MM`.
    pub fn url_template(&self) -> &'static str {
        match self {
            Self::Brand => "https://www.autohome.com.cn/rank/1-3-1071-x/{period}.html",
            Self::Model => "https://www.autohome.com.cn/rank/1-1-0-0_9000-x-x-x/{period}.html",
        }
    }

    pub fn month_url(&self, period: &Period) -> String {
        self.url_template().replace("{period}", period.as_str())
    }

    /// Brand boards are ordered by sales; model boards keep the site's order.
    pub fn default_sort(&self) -> SortPolicy {
        match self {
            Self::Brand => SortPolicy::ValueDesc,
            Self::Model => SortPolicy::SourceRankAsc,
        }
    }

    /// Human-readable board name, used in file names.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Brand => "汽车品牌",
            Self::Model => "汽车车型",
        }
    }

    /// Column header for the label column.
    pub fn label_header(&self) -> &'static str {
        match self {
            Self::Brand => "品牌",
            Self::Model => "车型",
        }
    }

    pub fn sheet_name(&self) -> &'static str {
        match self {
            Self::Brand => "汽车品牌销量",
            Self::Model => "汽车车型销量",
        }
    }
}

/// Ordering used when ranking a month and when sorting the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SortPolicy {
    /// Highest sales first.
    ValueDesc,
    /// Rank printed on the page, lowest first.
    SourceRankAsc,
}

/// An unvalidated label/value pair produced by one extraction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub label: String,
    pub raw_value: String,
    /// Rank as printed by the source page, when the strategy can read it.
    pub source_rank: Option<u32>,
}

impl Candidate {
    pub fn new(label: impl Into<String>, raw_value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            raw_value: raw_value.into(),
            source_rank: None,
        }
    }

    pub fn with_source_rank(mut self, rank: u32) -> Self {
        self.source_rank = Some(rank);
        self
    }

    /// Parse the raw value, ignoring separators and units such as `12,345辆`.
    pub fn parse_value(&self) -> Result<u64> {
        let digits: String = self.raw_value.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Err(ScrapeError::Value {
                raw: self.raw_value.clone(),
            });
        }
        digits.parse().map_err(|_| ScrapeError::Value {
            raw: self.raw_value.clone(),
        })
    }
}

/// A validated candidate: label present, value parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesEntry {
    pub label: String,
    pub value: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_rank: Option<u32>,
}

impl SalesEntry {
    pub fn new(label: impl Into<String>, value: u64) -> Self {
        Self {
            label: label.into(),
            value,
            source_rank: None,
        }
    }
}

/// A ranked entry for one month, not yet tagged with its period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub rank: u32,
    pub label: String,
    pub value: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_rank: Option<u32>,
}

impl From<RankedEntry> for SalesEntry {
    fn from(e: RankedEntry) -> Self {
        Self {
            label: e.label,
            value: e.value,
            source_rank: e.source_rank,
        }
    }
}

/// One exported row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub period: Period,
    pub rank: u32,
    pub label: String,
    pub value: u64,
}

impl SalesRecord {
    pub fn tagged(entry: RankedEntry, period: &Period) -> Self {
        Self {
            period: period.clone(),
            rank: entry.rank,
            label: entry.label,
            value: entry.value,
        }
    }
}

/// A month to scrape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthTarget {
    pub url: String,
    pub period: Period,
}

impl MonthTarget {
    pub fn for_kind(kind: RankingKind, period: Period) -> Self {
        Self {
            url: kind.month_url(&period),
            period,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_strips_units() {
        assert_eq!(Candidate::new("秦PLUS", "12,345辆").parse_value().unwrap(), 12345);
        assert_eq!(Candidate::new("A", "8000").parse_value().unwrap(), 8000);
    }

    #[test]
    fn test_parse_value_rejects_garbage() {
        assert!(Candidate::new("A", "暂无").parse_value().is_err());
        assert!(Candidate::new("A", "99999999999999999999999").parse_value().is_err());
    }

    #[test]
    fn test_month_url() {
        let p = Period::parse("2025-07").unwrap();
        let t = MonthTarget::for_kind(RankingKind::Model, p);
        assert_eq!(t.url, "https://www.autohome.com.cn/rank/1-1-0-0_9000-x-x-x/2025-07.html");
        assert_eq!(Period::from_url(&t.url), Some(t.period));
    }
}
