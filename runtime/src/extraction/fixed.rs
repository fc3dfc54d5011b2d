//! Structural extraction for the model ranking board.
//!
//! Rows and their fields are matched by exact utility-class paths. There is
//! no fallback: if the markup changes, the page yields nothing.

use super::{parse_selector, ExtractionStrategy, ParsedPage};
use crate::error::Result;
use crate::model::Candidate;
use scraper::{ElementRef, Selector};
use tracing::warn;

const ROW: &str = r".tw-relative.tw-grid.tw-items-center.tw-grid-cols-\[65px_168px_200px_auto_92px\]";
const RANK: &str = r".tw-absolute .tw-min-w-\[50px\].tw-bg-\[length\:100\%\]";
const LABEL: &str = r".tw-flex.tw-flex-col .tw-text-nowrap.tw-text-lg";
const VALUE: &str = r".tw-mx-4 .tw-pt-\[5px\] .tw-text-\[18px\].tw-font-bold";

pub struct FixedRowStrategy {
    row: Selector,
    rank: Selector,
    label: Selector,
    value: Selector,
}

impl FixedRowStrategy {
    pub fn new() -> Result<Self> {
        Ok(Self {
            row: parse_selector(ROW)?,
            rank: parse_selector(RANK)?,
            label: parse_selector(LABEL)?,
            value: parse_selector(VALUE)?,
        })
    }
}

fn field_text(row: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    let el = row.select(selector).next()?;
    let text = el.text().collect::<String>().trim().to_string();
    (!text.is_empty()).then_some(text)
}

impl ExtractionStrategy for FixedRowStrategy {
    fn name(&self) -> &'static str {
        "fixed-row"
    }

    fn candidates(&self, page: &ParsedPage<'_>) -> Vec<Candidate> {
        let mut out = Vec::new();
        for (index, row) in page.document.select(&self.row).enumerate() {
            let position = index as u32 + 1;
            let rank = field_text(&row, &self.rank)
                .and_then(|t| t.parse::<u32>().ok())
                .unwrap_or(position);

            let Some(label) = field_text(&row, &self.label) else {
                warn!("row {position}: no model name, skipping");
                continue;
            };
            let Some(value) = field_text(&row, &self.value) else {
                warn!("row {position} ({label}): no sales figure, skipping");
                continue;
            };
            out.push(Candidate::new(label, value).with_source_rank(rank));
        }
        out
    }

    /// Fields are located structurally, so small figures are genuine.
    fn applies_value_floor(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{ExtractionThresholds, RecordExtractor};
    use crate::model::{RankingKind, SalesEntry};
    use crate::renderer::DocumentSnapshot;

    fn row(rank: &str, name: &str, sales: &str) -> String {
        format!(
            r#"<div class="tw-relative tw-grid tw-items-center tw-grid-cols-[65px_168px_200px_auto_92px]">
                 <div class="tw-absolute"><div class="tw-min-w-[50px] tw-bg-[length:100%]">{rank}</div></div>
                 <div class="tw-flex tw-flex-col"><div class="tw-text-nowrap tw-text-lg">{name}</div></div>
                 <div class="tw-mx-4"><div class="tw-pt-[5px]"><span class="tw-text-[18px] tw-font-bold">{sales}</span></div></div>
               </div>"#
        )
    }

    #[test]
    fn test_fixed_rows() {
        let html = format!(
            "<html><body>{}{}{}{}</body></html>",
            row("1", "Model Y", "40,123"),
            row("", "秦PLUS", "35010"),
            row("3", "", "30000"),
            row("4", "小米SU7", "850"),
        );
        let snapshot = DocumentSnapshot::from_html("u", html);
        let strategy = FixedRowStrategy::new().unwrap();
        let got = strategy.candidates(&ParsedPage::new(&snapshot));
        assert_eq!(
            got,
            vec![
                Candidate::new("Model Y", "40,123").with_source_rank(1),
                Candidate::new("秦PLUS", "35010").with_source_rank(2),
                Candidate::new("小米SU7", "850").with_source_rank(4),
            ]
        );

        let extraction = RecordExtractor::for_kind(RankingKind::Model, ExtractionThresholds::default())
            .unwrap()
            .extract(&snapshot);
        assert_eq!(extraction.strategy, Some("fixed-row"));
        assert_eq!(extraction.entries.len(), 3);
        assert_eq!(
            extraction.entries[2],
            SalesEntry {
                label: "小米SU7".into(),
                value: 850,
                source_rank: Some(4),
            }
        );
    }

    #[test]
    fn test_fails_closed_on_other_markup() {
        let html = r#"<html><body><ul><li><img alt="比亚迪"> 1 380000</li></ul>
            <p>1 比亚迪 380000</p></body></html>"#;
        let extraction = RecordExtractor::for_kind(RankingKind::Model, ExtractionThresholds::default())
            .unwrap()
            .extract(&DocumentSnapshot::from_html("u", html));
        assert!(extraction.is_empty());
    }
}
