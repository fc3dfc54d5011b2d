//! `salesrank scrape`: scrape a range of months and export the aggregate.

use crate::aggregate::{MonthlyAggregator, RateLimiter, RunReport};
use crate::cli::output::{self, Styled};
use crate::cli::progress::MonthProgress;
use crate::config::ScrapeConfig;
use crate::export::{exporter_for, ExportFormat, ExportOutcome};
use crate::extraction::RecordExtractor;
use crate::model::{Period, RankingKind, SalesRecord, SortPolicy};
use crate::pool::PoolManager;
use crate::renderer::chromium::{ChromiumOptions, ChromiumRenderer};
use crate::renderer::fixture::FixtureRenderer;
use crate::renderer::{RenderOptions, Renderer};
use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Records shown after a successful run.
const PREVIEW_ROWS: usize = 10;

#[derive(Debug, Clone, Default, Args)]
pub struct ScrapeArgs {
    /// Ranking board to scrape.
    #[arg(long, value_enum)]
    pub kind: Option<RankingKind>,
    /// First month, YYYY-MM.
    #[arg(long)]
    pub from: Option<Period>,
    /// Last month, YYYY-MM (inclusive).
    #[arg(long)]
    pub to: Option<Period>,
    /// Scrape these month pages instead of the range (repeatable).
    #[arg(long = "url")]
    pub urls: Vec<String>,
    /// Output file path.
    #[arg(long)]
    pub out: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub format: Option<ExportFormat>,
    /// Pause between months, in milliseconds.
    #[arg(long)]
    pub delay_ms: Option<u64>,
    /// Quiet period after scrolling, in milliseconds.
    #[arg(long)]
    pub settle_ms: Option<u64>,
    /// Smallest sales figure accepted by the heuristic tiers.
    #[arg(long)]
    pub min_value: Option<u64>,
    #[arg(long, value_enum)]
    pub sort: Option<SortPolicy>,
    /// Show the browser window.
    #[arg(long)]
    pub headed: bool,
    /// Chromium executable to launch.
    #[arg(long)]
    pub chromium: Option<PathBuf>,
    /// Serve `<dir>/<YYYY-MM>.html` recordings instead of browsing.
    #[arg(long)]
    pub replay: Option<PathBuf>,
    /// JSON config file; flags override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Also print the top N of every month.
    #[arg(long)]
    pub top: Option<u32>,
}

impl ScrapeArgs {
    /// Layer the flags over the config file (or the defaults).
    pub fn to_config(&self) -> Result<ScrapeConfig> {
        let mut config = match &self.config {
            Some(path) => ScrapeConfig::load(path)?,
            None => ScrapeConfig::default(),
        };

        if let Some(kind) = self.kind {
            config.kind = kind;
        }
        if self.from.is_some() {
            config.from = self.from.clone();
        }
        if self.to.is_some() {
            config.to = self.to.clone();
        }
        if !self.urls.is_empty() {
            config.urls = self.urls.clone();
        }
        if self.out.is_some() {
            config.output = self.out.clone();
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(delay) = self.delay_ms {
            config.delay_ms = delay;
        }
        if let Some(settle) = self.settle_ms {
            config.render.settle_ms = settle;
        }
        if let Some(min) = self.min_value {
            config.thresholds.min_value = min;
        }
        if self.sort.is_some() {
            config.sort = self.sort;
        }
        if self.chromium.is_some() {
            config.chromium_path = self.chromium.clone();
        }
        if self.replay.is_some() {
            config.replay_dir = self.replay.clone();
        }
        config.headed |= self.headed;
        Ok(config)
    }
}

pub async fn run(args: ScrapeArgs) -> Result<()> {
    let config = args.to_config()?;
    let targets = config.targets()?;
    let start = Instant::now();

    let (renderer, render, delay_ms): (Arc<dyn Renderer>, RenderOptions, u64) = match &config.replay_dir {
        Some(dir) => {
            info!("replaying recorded pages from {}", dir.display());
            let fixture = FixtureRenderer::from_dir(dir, &targets)?;
            (Arc::new(fixture), RenderOptions::immediate(), 0)
        }
        None => {
            let chromium = ChromiumRenderer::new(ChromiumOptions {
                executable: config.chromium_path.clone(),
                headed: config.headed,
                ..Default::default()
            });
            (Arc::new(chromium), config.render.clone(), config.delay_ms)
        }
    };

    let extractor = RecordExtractor::for_kind(config.kind, config.thresholds.clone())?;
    let aggregator = MonthlyAggregator::new(
        PoolManager::new(renderer, config.max_contexts),
        extractor,
        RateLimiter::new(delay_ms),
        render,
        config.sort_policy(),
    );

    let report = if output::is_quiet() || output::is_json() {
        aggregator.run(&targets).await
    } else {
        output::print_header(&Styled::new());
        let progress = MonthProgress::new();
        let report = aggregator.run_with(&targets, &progress).await;
        progress.finish();
        report
    };

    let path = config.output_path(&targets);
    let outcome = exporter_for(config.format, config.kind)
        .export(&report.records, &path)
        .with_context(|| format!("exporting to {}", path.display()))?;
    let elapsed = start.elapsed().as_millis();

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "kind": config.kind,
            "output": written_path(&outcome, &path),
            "elapsed_ms": elapsed,
            "months": report.months,
            "records": report.records,
        }));
        return Ok(());
    }
    if !output::is_quiet() {
        print_summary(&Styled::new(), &report, &outcome, &path, elapsed);
        if let Some(n) = args.top {
            print_top(&report.records, n);
        }
    }
    Ok(())
}

fn written_path(outcome: &ExportOutcome, path: &Path) -> Option<String> {
    match outcome {
        ExportOutcome::Written { .. } => Some(path.display().to_string()),
        ExportOutcome::Skipped => None,
    }
}

fn print_summary(s: &Styled, report: &RunReport, outcome: &ExportOutcome, path: &Path, elapsed: u128) {
    eprintln!();
    eprintln!(
        "  {} of {} months scraped, {} records in {}",
        report.scraped_months(),
        report.months.len(),
        report.records.len(),
        output::format_elapsed(elapsed)
    );
    if report.failed_months() > 0 {
        eprintln!("  {} {} months failed", s.warn_sym(), report.failed_months());
    }

    match outcome {
        ExportOutcome::Written { rows } => {
            eprintln!("  {} saved {rows} rows to {}", s.ok_sym(), s.cyan(&path.display().to_string()));
            eprintln!();
            output::print_section(s, &format!("First {} records", PREVIEW_ROWS.min(report.records.len())));
            let preview = &report.records[..PREVIEW_ROWS.min(report.records.len())];
            for line in output::record_lines(preview) {
                eprintln!("    {line}");
            }
        }
        ExportOutcome::Skipped => {
            eprintln!("  {} no data scraped, nothing saved", s.warn_sym());
        }
    }
}

fn print_top(records: &[SalesRecord], n: u32) {
    let s = Styled::new();
    let mut current: Option<&Period> = None;
    for record in records.iter().filter(|r| r.rank <= n) {
        if current != Some(&record.period) {
            eprintln!();
            output::print_section(&s, &format!("{} top {n}", record.period));
            current = Some(&record.period);
        }
        for line in output::record_lines(std::slice::from_ref(record)) {
            eprintln!("    {line}");
        }
    }
}
