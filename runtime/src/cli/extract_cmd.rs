//! `salesrank extract <file.html>`: run an extractor against a saved page.

use crate::cli::output::{self, Styled};
use crate::extraction::{ExtractionThresholds, RecordExtractor};
use crate::model::{RankedEntry, RankingKind, SortPolicy};
use crate::ranking;
use crate::renderer::DocumentSnapshot;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Clone, Args)]
pub struct ExtractArgs {
    /// Saved HTML page.
    pub file: PathBuf,
    #[arg(long, value_enum, default_value_t = RankingKind::Brand)]
    pub kind: RankingKind,
    #[arg(long)]
    pub min_value: Option<u64>,
    #[arg(long, value_enum)]
    pub sort: Option<SortPolicy>,
}

/// Extract and rank the entries of one saved page.
pub fn extract_file(args: &ExtractArgs) -> Result<(Option<&'static str>, Vec<RankedEntry>)> {
    let html = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let mut thresholds = ExtractionThresholds::default();
    if let Some(min) = args.min_value {
        thresholds.min_value = min;
    }

    let extractor = RecordExtractor::for_kind(args.kind, thresholds)?;
    let snapshot = DocumentSnapshot::from_html(args.file.display().to_string(), html);
    let extraction = extractor.extract(&snapshot);
    let policy = args.sort.unwrap_or_else(|| args.kind.default_sort());
    Ok((extraction.strategy, ranking::rank_entries(extraction.entries, policy)))
}

pub async fn run(args: ExtractArgs) -> Result<()> {
    let (strategy, entries) = extract_file(&args)?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "file": args.file.display().to_string(),
            "kind": args.kind,
            "strategy": strategy,
            "entries": entries,
        }));
        return Ok(());
    }

    let s = Styled::new();
    match strategy {
        Some(name) => eprintln!("  {} {} entries via {}", s.ok_sym(), entries.len(), s.cyan(name)),
        None => {
            eprintln!("  {} no strategy matched {}", s.warn_sym(), args.file.display());
            return Ok(());
        }
    }
    if output::is_quiet() {
        return Ok(());
    }

    let width = entries.iter().map(|e| e.label.chars().count()).max().unwrap_or(0);
    for entry in &entries {
        let pad = " ".repeat(width - entry.label.chars().count());
        eprintln!("    {:>3}  {}{pad}  {:>8}", entry.rank, entry.label, entry.value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL_ROW: &str = r#"<div class="tw-relative tw-grid tw-items-center tw-grid-cols-[65px_168px_200px_auto_92px]">
        <div class="tw-absolute"><div class="tw-min-w-[50px] tw-bg-[length:100%]">ROWRANK</div></div>
        <div class="tw-flex tw-flex-col"><div class="tw-text-nowrap tw-text-lg">LABEL</div></div>
        <div class="tw-mx-4"><div class="tw-pt-[5px]"><span class="tw-text-[18px] tw-font-bold">VALUE</span></div></div>
    </div>"#;

    fn row(rank: &str, label: &str, value: &str) -> String {
        MODEL_ROW
            .replace("ROWRANK", rank)
            .replace("LABEL", label)
            .replace("VALUE", value)
    }

    #[test]
    fn test_extract_saved_model_page() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("2025-05.html");
        let html = format!(
            "<html><body>{}{}</body></html>",
            row("1", "Model Y", "40,123"),
            row("2", "秦PLUS", "35,002")
        );
        std::fs::write(&file, html).unwrap();

        let args = ExtractArgs {
            file,
            kind: RankingKind::Model,
            min_value: None,
            sort: None,
        };
        let (strategy, entries) = extract_file(&args).unwrap();
        assert_eq!(strategy, Some("fixed-row"));
        let got: Vec<(u32, &str, u64)> = entries.iter().map(|e| (e.rank, e.label.as_str(), e.value)).collect();
        assert_eq!(got, [(1, "Model Y", 40_123), (2, "秦PLUS", 35_002)]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let args = ExtractArgs {
            file: PathBuf::from("/nonexistent/page.html"),
            kind: RankingKind::Brand,
            min_value: None,
            sort: None,
        };
        assert!(extract_file(&args).is_err());
    }
}
