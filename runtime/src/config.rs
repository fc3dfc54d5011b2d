//! Run configuration.
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! an optional JSON file (`--config`), then command-line flags. Every field
//! of the file is optional.

use crate::aggregate::DEFAULT_DELAY_MS;
use crate::error::{Result, ScrapeError};
use crate::export::ExportFormat;
use crate::extraction::ExtractionThresholds;
use crate::model::{MonthTarget, Period, RankingKind, SortPolicy};
use crate::renderer::RenderOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// First month scraped when no range is given.
pub const DEFAULT_FROM: &str = "2025-04";
/// Last month scraped when no range is given.
pub const DEFAULT_TO: &str = "2025-09";
/// Directory that receives output files by default.
pub const DEFAULT_OUTPUT_DIR: &str = "下载数据";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub kind: RankingKind,
    pub from: Option<Period>,
    pub to: Option<Period>,
    /// Explicit month URLs; each must end in `YYYY-MM.html`. Overrides the range.
    pub urls: Vec<String>,
    pub output: Option<PathBuf>,
    pub format: ExportFormat,
    pub delay_ms: u64,
    /// Overrides the kind's default ordering.
    pub sort: Option<SortPolicy>,
    pub render: RenderOptions,
    pub thresholds: ExtractionThresholds,
    pub headed: bool,
    pub chromium_path: Option<PathBuf>,
    /// Directory of recorded `<period>.html` pages to replay instead of browsing.
    pub replay_dir: Option<PathBuf>,
    pub max_contexts: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            kind: RankingKind::default(),
            from: None,
            to: None,
            urls: Vec::new(),
            output: None,
            format: ExportFormat::default(),
            delay_ms: DEFAULT_DELAY_MS,
            sort: None,
            render: RenderOptions::default(),
            thresholds: ExtractionThresholds::default(),
            headed: false,
            chromium_path: None,
            replay_dir: None,
            max_contexts: 1,
        }
    }
}

impl ScrapeConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScrapeError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| ScrapeError::Config(format!("parsing config: {e}")))
    }

    pub fn sort_policy(&self) -> SortPolicy {
        self.sort.unwrap_or_else(|| self.kind.default_sort())
    }

    /// The months to scrape, in the order given.
    pub fn targets(&self) -> Result<Vec<MonthTarget>> {
        if !self.urls.is_empty() {
            let mut seen = HashSet::new();
            return self
                .urls
                .iter()
                .map(|url| {
                    let period = Period::from_url(url)
                        .ok_or_else(|| ScrapeError::Config(format!("no YYYY-MM.html period in {url}")))?;
                    if !seen.insert(period.clone()) {
                        return Err(ScrapeError::Config(format!("period {period} given more than once ({url})")));
                    }
                    Ok(MonthTarget {
                        url: url.clone(),
                        period,
                    })
                })
                .collect();
        }

        let from = match &self.from {
            Some(p) => p.clone(),
            None => Period::parse(DEFAULT_FROM)?,
        };
        let to = match &self.to {
            Some(p) => p.clone(),
            None => Period::parse(DEFAULT_TO)?,
        };
        Ok(Period::range(&from, &to)?
            .into_iter()
            .map(|p| MonthTarget::for_kind(self.kind, p))
            .collect())
    }

    /// Explicit output path, or `下载数据/<board>截至<year>年<month>月销量数据.<ext>`
    /// named after the last month.
    pub fn output_path(&self, targets: &[MonthTarget]) -> PathBuf {
        if let Some(path) = &self.output {
            return path.clone();
        }
        let name = match targets.iter().map(|t| &t.period).max() {
            Some(last) => format!(
                "{}截至{}年{}月销量数据.{}",
                self.kind.display_name(),
                last.year(),
                last.month(),
                self.format.extension()
            ),
            None => format!("{}销量数据.{}", self.kind.display_name(), self.format.extension()),
        };
        Path::new(DEFAULT_OUTPUT_DIR).join(name)
    }
}
