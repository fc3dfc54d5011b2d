//! `YYYY-MM` calendar month identifiers.

use crate::error::{Result, ScrapeError};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static PERIOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}$").expect("period regex is valid"));

static URL_PERIOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{4}-[0-9]{2})\.html").expect("url period regex is valid"));

/// A calendar month, always zero-padded so string order is chronological.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period(String);

impl Period {
    /// Build a period from a year and a 1-based month.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        Self::parse(&format!("{year:04}-{month:02}"))
    }

    /// Parse a `YYYY-MM` string, rejecting unpadded or out-of-range months.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if !PERIOD_RE.is_match(s) {
            return Err(ScrapeError::InvalidPeriod(s.to_string()));
        }
        NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
            .map_err(|_| ScrapeError::InvalidPeriod(s.to_string()))?;
        Ok(Self(s.to_string()))
    }

    /// Pull the period out of a ranking URL ending in `YYYY-MM.html`.
    pub fn from_url(url: &str) -> Option<Self> {
        let caps = URL_PERIOD_RE.captures(url)?;
        Self::parse(caps.get(1)?.as_str()).ok()
    }

    /// Every month from `from` to `to`, both inclusive.
    pub fn range(from: &Period, to: &Period) -> Result<Vec<Period>> {
        if from > to {
            return Err(ScrapeError::EmptyRange {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        let mut out = vec![from.clone()];
        let mut current = from.clone();
        while &current < to {
            current = current.next();
            out.push(current.clone());
        }
        Ok(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn year(&self) -> i32 {
        self.first_day().year()
    }

    pub fn month(&self) -> u32 {
        self.first_day().month()
    }

    /// The following calendar month.
    pub fn next(&self) -> Period {
        let (year, month) = match self.month() {
            12 => (self.year() + 1, 1),
            m => (self.year(), m + 1),
        };
        Period(format!("{year:04}-{month:02}"))
    }

    fn first_day(&self) -> NaiveDate {
        // Validated on construction.
        NaiveDate::parse_from_str(&format!("{}-01", self.0), "%Y-%m-%d").unwrap_or_default()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Period {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Period {
    type Error = ScrapeError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Period> for String {
    fn from(p: Period) -> Self {
        p.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_and_invalid() {
        assert_eq!(Period::parse("2025-04").unwrap().as_str(), "2025-04");
        assert!(Period::parse("2025-4").is_err());
        assert!(Period::parse("2025-13").is_err());
        assert!(Period::parse("2025-00").is_err());
        assert!(Period::parse("未知日期1").is_err());
    }

    #[test]
    fn test_from_url() {
        let p = Period::from_url("https://www.autohome.com.cn/rank/1-3-1071-x/2025-06.html").unwrap();
        assert_eq!(p.as_str(), "2025-06");
        assert!(Period::from_url("https://www.autohome.com.cn/rank/").is_none());
    }

    #[test]
    fn test_range_crosses_year() {
        let from = Period::parse("2024-11").unwrap();
        let to = Period::parse("2025-02").unwrap();
        let months: Vec<String> = Period::range(&from, &to)
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(months, ["2024-11", "2024-12", "2025-01", "2025-02"]);
    }

    #[test]
    fn test_range_rejects_reversed() {
        let from = Period::parse("2025-09").unwrap();
        let to = Period::parse("2025-04").unwrap();
        assert!(matches!(Period::range(&from, &to), Err(ScrapeError::EmptyRange { .. })));
    }

    #[test]
    fn test_lexicographic_order_is_chronological() {
        let a = Period::parse("2024-12").unwrap();
        let b = Period::parse("2025-01").unwrap();
        assert!(a < b);
        assert_eq!(a.year(), 2024);
        assert_eq!(b.month(), 1);
    }
}
