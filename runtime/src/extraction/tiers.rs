//! Heuristic tiers for the brand ranking board, loosest last.

use super::numbers::{first_long_token, first_plausible_token};
use super::{parse_selector, ExtractionStrategy, ExtractionThresholds, ParsedPage};
use crate::error::{Result, ScrapeError};
use crate::model::Candidate;
use regex::Regex;
use scraper::{ElementRef, Selector};
use tracing::warn;

/// Markers in `alt` text that identify decoration rather than a brand.
const DECORATION_MARKERS: &[&str] = &["logo", "icon"];

fn element_text(el: &ElementRef<'_>) -> String {
    el.text().map(str::trim).filter(|t| !t.is_empty()).collect::<Vec<_>>().join(" ")
}

/// Tier 1: ranking cards. Each `div.content` holds brand images; the sales
/// figure sits in the text of the image's nearest enclosing `div`.
pub struct ContainerTier {
    container: Selector,
    image: Selector,
    thresholds: ExtractionThresholds,
}

impl ContainerTier {
    pub fn new(thresholds: ExtractionThresholds) -> Result<Self> {
        Ok(Self {
            container: parse_selector("div.content")?,
            image: parse_selector("img")?,
            thresholds,
        })
    }
}

impl ExtractionStrategy for ContainerTier {
    fn name(&self) -> &'static str {
        "container"
    }

    fn candidates(&self, page: &ParsedPage<'_>) -> Vec<Candidate> {
        let mut out = Vec::new();
        for container in page.document.select(&self.container) {
            for img in container.select(&self.image) {
                let Some(alt) = img.value().attr("alt").map(str::trim) else {
                    continue;
                };
                if alt.is_empty() || DECORATION_MARKERS.iter().any(|m| alt.contains(m)) {
                    continue;
                }
                let Some(card) = img
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .find(|e| e.value().name() == "div")
                else {
                    continue;
                };
                let text = element_text(&card);
                if let Some(token) = first_plausible_token(&text, &self.thresholds) {
                    out.push(Candidate::new(alt, token));
                }
            }
        }
        out
    }
}

/// Tier 2: generic list rows with a brand image and a long number.
pub struct ListItemTier {
    item: Selector,
    image: Selector,
    thresholds: ExtractionThresholds,
}

impl ListItemTier {
    pub fn new(thresholds: ExtractionThresholds) -> Result<Self> {
        Ok(Self {
            item: parse_selector("li, div.item, div.rank-list-item")?,
            image: parse_selector("img")?,
            thresholds,
        })
    }
}

impl ExtractionStrategy for ListItemTier {
    fn name(&self) -> &'static str {
        "list-item"
    }

    fn candidates(&self, page: &ParsedPage<'_>) -> Vec<Candidate> {
        let mut out = Vec::new();
        for item in page.document.select(&self.item) {
            let Some(alt) = item
                .select(&self.image)
                .next()
                .and_then(|img| img.value().attr("alt"))
                .map(str::trim)
            else {
                continue;
            };
            if !self.thresholds.accepts_label(alt) {
                continue;
            }
            let text = element_text(&item);
            if let Some(token) = first_long_token(&text, self.thresholds.min_digits) {
                out.push(Candidate::new(alt, token));
            }
        }
        out
    }
}

/// Tier 3: regex over the rendered text, matching
/// `<rank> <2-10 CJK characters> <long number>`.
pub struct FullTextTier {
    pattern: Regex,
}

impl FullTextTier {
    pub fn new(thresholds: &ExtractionThresholds) -> Result<Self> {
        let pattern = format!(
            r"([0-9]+)\s*([\x{{4e00}}-\x{{9fa5}}]{{2,10}})\s*([0-9]{{{},}})",
            thresholds.min_digits.max(1)
        );
        let pattern = Regex::new(&pattern).map_err(|e| ScrapeError::Config(format!("full-text pattern: {e}")))?;
        Ok(Self { pattern })
    }
}

impl ExtractionStrategy for FullTextTier {
    fn name(&self) -> &'static str {
        "full-text"
    }

    fn candidates(&self, page: &ParsedPage<'_>) -> Vec<Candidate> {
        self.pattern
            .captures_iter(page.text)
            .filter_map(|caps| {
                let label = caps.get(2)?.as_str();
                let value = caps.get(3)?.as_str();
                let raw = caps.get(1)?.as_str();
                let rank = match raw.parse::<u32>() {
                    Ok(rank) => rank,
                    Err(e) => {
                        warn!("ignoring {label} {value}: rank {raw}: {e}");
                        return None;
                    }
                };
                Some(Candidate::new(label, value).with_source_rank(rank))
            })
            .collect()
    }
}
