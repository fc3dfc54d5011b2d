//! Record extraction from rendered ranking pages.
//!
//! An extractor is an ordered list of [`ExtractionStrategy`]s. Strategies are
//! tried in order and the first one that yields at least one accepted entry
//! wins; later strategies never run. Brand boards use the three heuristic
//! tiers in [`tiers`]; model boards use the single structural strategy in
//! [`fixed`], which has no fallback.

pub mod fixed;
pub mod numbers;
pub mod tiers;

use crate::error::{Result, ScrapeError};
use crate::model::{Candidate, RankingKind, SalesEntry};
use crate::renderer::DocumentSnapshot;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Plausibility limits applied to heuristic candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionThresholds {
    /// Smallest value accepted as a monthly sales figure (inclusive).
    pub min_value: u64,
    /// Minimum digit count for a token to count as a sales figure.
    pub min_digits: usize,
    /// Label length bounds, in characters, for list-item labels.
    pub min_label_chars: usize,
    pub max_label_chars: usize,
}

impl Default for ExtractionThresholds {
    fn default() -> Self {
        Self {
            min_value: 1000,
            min_digits: 4,
            min_label_chars: 2,
            max_label_chars: 9,
        }
    }
}

impl ExtractionThresholds {
    pub fn accepts_value(&self, value: u64) -> bool {
        value >= self.min_value
    }

    pub fn accepts_label(&self, label: &str) -> bool {
        let n = label.chars().count();
        n >= self.min_label_chars && n <= self.max_label_chars
    }
}

/// A parsed page handed to each strategy.
pub struct ParsedPage<'a> {
    pub document: Html,
    /// Rendered body text.
    pub text: &'a str,
}

impl<'a> ParsedPage<'a> {
    pub fn new(snapshot: &'a DocumentSnapshot) -> Self {
        Self {
            document: Html::parse_document(&snapshot.html),
            text: &snapshot.text,
        }
    }
}

/// One way of reading candidates off a page.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Candidates in discovery order. Never fails; an empty list means the
    /// page did not have the shape this strategy looks for.
    fn candidates(&self, page: &ParsedPage<'_>) -> Vec<Candidate>;

    /// Whether candidates must clear the plausibility floor.
    fn applies_value_floor(&self) -> bool {
        true
    }
}

/// Entries accepted from a page and the strategy that produced them.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub strategy: Option<&'static str>,
    pub entries: Vec<SalesEntry>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Runs strategies in order until one yields data.
pub struct RecordExtractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    thresholds: ExtractionThresholds,
}

impl RecordExtractor {
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>, thresholds: ExtractionThresholds) -> Self {
        Self { strategies, thresholds }
    }

    /// The extractor appropriate for a ranking board.
    pub fn for_kind(kind: RankingKind, thresholds: ExtractionThresholds) -> Result<Self> {
        let strategies: Vec<Box<dyn ExtractionStrategy>> = match kind {
            RankingKind::Brand => vec![
                Box::new(tiers::ContainerTier::new(thresholds.clone())?),
                Box::new(tiers::ListItemTier::new(thresholds.clone())?),
                Box::new(tiers::FullTextTier::new(&thresholds)?),
            ],
            RankingKind::Model => vec![Box::new(fixed::FixedRowStrategy::new()?)],
        };
        Ok(Self::new(strategies, thresholds))
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn extract(&self, snapshot: &DocumentSnapshot) -> Extraction {
        let page = ParsedPage::new(snapshot);
        for strategy in &self.strategies {
            let candidates = strategy.candidates(&page);
            let found = candidates.len();
            let entries = accept(candidates, &self.thresholds, strategy.applies_value_floor());
            debug!(
                "{}: {} candidates, {} accepted on {}",
                strategy.name(),
                found,
                entries.len(),
                snapshot.url
            );
            if !entries.is_empty() {
                return Extraction {
                    strategy: Some(strategy.name()),
                    entries,
                };
            }
        }
        Extraction::default()
    }
}

/// Validate candidates: non-empty label, parseable value above the floor,
/// first occurrence of each label wins.
pub fn accept(candidates: Vec<Candidate>, thresholds: &ExtractionThresholds, floor: bool) -> Vec<SalesEntry> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for candidate in candidates {
        let label = candidate.label.trim();
        if label.is_empty() {
            continue;
        }
        let value = match candidate.parse_value() {
            Ok(v) => v,
            Err(e) => {
                warn!("skipping {label}: {e}");
                continue;
            }
        };
        if floor && !thresholds.accepts_value(value) {
            continue;
        }
        if !seen.insert(label.to_string()) {
            continue;
        }
        out.push(SalesEntry {
            label: label.to_string(),
            value,
            source_rank: candidate.source_rank,
        });
    }
    out
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, Vec<Candidate>);

    impl ExtractionStrategy for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }
        fn candidates(&self, _page: &ParsedPage<'_>) -> Vec<Candidate> {
            self.1.clone()
        }
    }

    #[test]
    fn test_accept_dedups_and_applies_floor() {
        let entries = accept(
            vec![
                Candidate::new("A", "5000"),
                Candidate::new("B", "8000"),
                Candidate::new("A", "5000"),
                Candidate::new("C", "999"),
                Candidate::new("  ", "4000"),
                Candidate::new("D", "n/a"),
            ],
            &ExtractionThresholds::default(),
            true,
        );
        assert_eq!(entries, vec![SalesEntry::new("A", 5000), SalesEntry::new("B", 8000)]);
    }

    #[test]
    fn test_floor_is_inclusive_and_tunable() {
        let thresholds = ExtractionThresholds {
            min_value: 500,
            ..Default::default()
        };
        let entries = accept(
            vec![Candidate::new("A", "500"), Candidate::new("B", "499")],
            &thresholds,
            true,
        );
        assert_eq!(entries, vec![SalesEntry::new("A", 500)]);
    }

    #[test]
    fn test_cascade_stops_at_first_non_empty() {
        let extractor = RecordExtractor::new(
            vec![
                Box::new(Fixed("empty", vec![])),
                Box::new(Fixed("below-floor", vec![Candidate::new("A", "12")])),
                Box::new(Fixed("good", vec![Candidate::new("B", "2000")])),
                Box::new(Fixed("never", vec![Candidate::new("C", "3000")])),
            ],
            ExtractionThresholds::default(),
        );
        let out = extractor.extract(&DocumentSnapshot::default());
        assert_eq!(out.strategy, Some("good"));
        assert_eq!(out.entries, vec![SalesEntry::new("B", 2000)]);
    }

    #[test]
    fn test_all_tiers_empty_is_not_an_error() {
        let extractor = RecordExtractor::for_kind(RankingKind::Brand, ExtractionThresholds::default()).unwrap();
        let out = extractor.extract(&DocumentSnapshot::from_html("u", "<html><body>nothing</body></html>"));
        assert!(out.is_empty());
        assert_eq!(out.strategy, None);
        assert_eq!(extractor.strategy_names(), ["container", "list-item", "full-text"]);
    }
}
