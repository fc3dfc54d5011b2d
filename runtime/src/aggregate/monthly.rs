//! Month-by-month scraping and aggregation.

use super::rate_limiter::RateLimiter;
use crate::error::ScrapeError;
use crate::extraction::RecordExtractor;
use crate::model::{MonthTarget, Period, SalesRecord, SortPolicy};
use crate::pool::PoolManager;
use crate::ranking;
use crate::renderer::{render_page, RenderOptions};
use serde::Serialize;
use tracing::{error, info, warn};

/// Default pause between two months, in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 2_000;

/// What happened to one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MonthOutcome {
    /// Records were extracted by `strategy`.
    Scraped { count: usize, strategy: String },
    /// The page loaded but no strategy found data.
    Empty,
    /// The page could not be loaded.
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthReport {
    pub period: Period,
    pub url: String,
    pub outcome: MonthOutcome,
}

/// Aggregated records plus per-month outcomes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub records: Vec<SalesRecord>,
    pub months: Vec<MonthReport>,
}

impl RunReport {
    pub fn scraped_months(&self) -> usize {
        self.months
            .iter()
            .filter(|m| matches!(m.outcome, MonthOutcome::Scraped { .. }))
            .count()
    }

    pub fn failed_months(&self) -> usize {
        self.months
            .iter()
            .filter(|m| matches!(m.outcome, MonthOutcome::Failed { .. }))
            .count()
    }
}

/// Progress hooks; every method defaults to doing nothing.
pub trait MonthObserver {
    fn month_started(&self, _index: usize, _total: usize, _target: &MonthTarget) {}
    fn month_finished(&self, _report: &MonthReport) {}
}

/// Observer that ignores all events.
pub struct Silent;

impl MonthObserver for Silent {}

/// Runs render, extract and rank for each month, then merges the months.
pub struct MonthlyAggregator {
    pool: PoolManager,
    extractor: RecordExtractor,
    limiter: RateLimiter,
    render: RenderOptions,
    policy: SortPolicy,
}

impl MonthlyAggregator {
    pub fn new(
        pool: PoolManager,
        extractor: RecordExtractor,
        limiter: RateLimiter,
        render: RenderOptions,
        policy: SortPolicy,
    ) -> Self {
        Self {
            pool,
            extractor,
            limiter,
            render,
            policy,
        }
    }

    pub async fn run(&self, targets: &[MonthTarget]) -> RunReport {
        self.run_with(targets, &Silent).await
    }

    /// Scrape every target in order. A month that fails or yields nothing
    /// contributes no records; the run always continues.
    pub async fn run_with(&self, targets: &[MonthTarget], observer: &dyn MonthObserver) -> RunReport {
        let mut records = Vec::new();
        let mut months = Vec::with_capacity(targets.len());

        for (index, target) in targets.iter().enumerate() {
            observer.month_started(index, targets.len(), target);
            info!("processing {} ({}/{})", target.period, index + 1, targets.len());

            let outcome = {
                let _slot = self.limiter.acquire().await;
                match self.scrape_month(target).await {
                    Ok(month) => {
                        let outcome = match month.strategy {
                            Some(strategy) if !month.records.is_empty() => {
                                info!("{}: {} records via {strategy}", target.period, month.records.len());
                                MonthOutcome::Scraped {
                                    count: month.records.len(),
                                    strategy: strategy.to_string(),
                                }
                            }
                            _ => {
                                warn!("{}: no sales data found", target.period);
                                MonthOutcome::Empty
                            }
                        };
                        records.extend(month.records);
                        outcome
                    }
                    Err(e) => {
                        error!("{}: {e}", target.period);
                        MonthOutcome::Failed { reason: e.to_string() }
                    }
                }
            };

            let report = MonthReport {
                period: target.period.clone(),
                url: target.url.clone(),
                outcome,
            };
            observer.month_finished(&report);
            months.push(report);
        }

        let records = ranking::finalize(records, self.policy);
        info!("{} records across {} months", records.len(), targets.len());
        RunReport { records, months }
    }

    /// One month: the context is released on every path once acquired.
    async fn scrape_month(&self, target: &MonthTarget) -> Result<MonthRecords, ScrapeError> {
        let render_err = |e: anyhow::Error| ScrapeError::Render {
            url: target.url.clone(),
            reason: format!("{e:#}"),
        };

        let mut handle = self.pool.acquire().await.map_err(render_err)?;
        let rendered = render_page(handle.context_mut(), &target.url, &self.render).await;
        if let Err(e) = self.pool.release(handle).await {
            warn!("closing browser for {}: {e:#}", target.period);
        }
        let snapshot = rendered.map_err(render_err)?;

        let extraction = self.extractor.extract(&snapshot);
        let records = ranking::rank_entries(extraction.entries, self.policy)
            .into_iter()
            .map(|entry| SalesRecord::tagged(entry, &target.period))
            .collect();

        Ok(MonthRecords {
            strategy: extraction.strategy,
            records,
        })
    }
}

struct MonthRecords {
    strategy: Option<&'static str>,
    records: Vec<SalesRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ExtractionThresholds;
    use crate::model::RankingKind;
    use crate::renderer::fixture::FixtureRenderer;
    use std::sync::Arc;

    fn target(period: &str) -> MonthTarget {
        MonthTarget::for_kind(RankingKind::Brand, Period::parse(period).unwrap())
    }

    fn aggregator(renderer: &FixtureRenderer, kind: RankingKind) -> MonthlyAggregator {
        MonthlyAggregator::new(
            PoolManager::new(Arc::new(renderer.clone()), 1),
            RecordExtractor::for_kind(kind, ExtractionThresholds::default()).unwrap(),
            RateLimiter::new(0),
            RenderOptions::immediate(),
            kind.default_sort(),
        )
    }

    const TWO_BRANDS: &str = r#"<html><body><div class="content">
        <div><img alt="吉利汽车"><span>150203</span></div>
        <div><img alt="比亚迪"><span>380512</span></div>
    </div></body></html>"#;

    const NO_DATA: &str = "<html><body><p>页面维护中</p></body></html>";

    #[tokio::test]
    async fn test_empty_month_contributes_nothing() {
        let april = target("2025-04");
        let may = target("2025-05");
        let renderer = FixtureRenderer::new()
            .with_page(&april.url, TWO_BRANDS)
            .with_page(&may.url, NO_DATA);

        let report = aggregator(&renderer, RankingKind::Brand)
            .run(&[april.clone(), may.clone()])
            .await;

        assert_eq!(report.records.len(), 2);
        assert!(report.records.iter().all(|r| r.period == april.period));
        assert_eq!(report.records[0].label, "比亚迪");
        assert_eq!(report.records[0].rank, 1);
        assert_eq!(report.records[1].rank, 2);
        assert_eq!(report.months[1].outcome, MonthOutcome::Empty);
        assert_eq!(renderer.closed_contexts(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_contained_and_contexts_closed() {
        let april = target("2025-04");
        let may = target("2025-05");
        let june = target("2025-06");
        // April's browser never launches; May's page is missing.
        let renderer = FixtureRenderer::new()
            .with_page(&april.url, TWO_BRANDS)
            .with_page(&june.url, TWO_BRANDS)
            .failing_context(0);

        let report = aggregator(&renderer, RankingKind::Brand)
            .run(&[april, may, june.clone()])
            .await;

        assert!(matches!(report.months[0].outcome, MonthOutcome::Failed { .. }));
        assert!(matches!(report.months[1].outcome, MonthOutcome::Failed { .. }));
        assert_eq!(report.failed_months(), 2);
        assert_eq!(report.scraped_months(), 1);
        assert_eq!(report.records.len(), 2);
        assert!(report.records.iter().all(|r| r.period == june.period));
        assert_eq!(renderer.opened_contexts(), 2);
        assert_eq!(renderer.closed_contexts(), 2);
    }

    #[tokio::test]
    async fn test_repeated_month_lists_each_label_once() {
        let april = target("2025-04");
        let renderer = FixtureRenderer::new().with_page(&april.url, TWO_BRANDS);

        let report = aggregator(&renderer, RankingKind::Brand)
            .run(&[april.clone(), april])
            .await;
        let got: Vec<(u32, &str)> = report.records.iter().map(|r| (r.rank, r.label.as_str())).collect();
        assert_eq!(got, [(1, "比亚迪"), (2, "吉利汽车")]);
        assert_eq!(report.scraped_months(), 2);
    }

    #[tokio::test]
    async fn test_months_sorted_and_reranked() {
        let april = target("2025-04");
        let may = target("2025-05");
        let may_page = r#"<html><body><div class="content">
            <div><img alt="特斯拉"><span>60000</span></div>
        </div></body></html>"#;
        let renderer = FixtureRenderer::new()
            .with_page(&april.url, TWO_BRANDS)
            .with_page(&may.url, may_page);

        // Months supplied out of order still come out chronological.
        let report = aggregator(&renderer, RankingKind::Brand).run(&[may, april]).await;
        let got: Vec<(&str, u32, &str)> = report
            .records
            .iter()
            .map(|r| (r.period.as_str(), r.rank, r.label.as_str()))
            .collect();
        assert_eq!(
            got,
            [("2025-04", 1, "比亚迪"), ("2025-04", 2, "吉利汽车"), ("2025-05", 1, "特斯拉")]
        );
    }
}
