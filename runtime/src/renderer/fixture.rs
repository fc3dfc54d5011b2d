//! Renderer backed by recorded HTML instead of a live browser.
//!
//! Used to replay saved ranking pages (`scrape --replay <dir>`) and by tests.

use super::{visible_text, NavigationResult, RenderContext, Renderer};
use crate::model::MonthTarget;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Default)]
struct Counters {
    attempts: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
    scroll_ticks: AtomicUsize,
}

/// Serves pages from an in-memory URL map.
#[derive(Clone, Default)]
pub struct FixtureRenderer {
    pages: Arc<HashMap<String, String>>,
    failing_contexts: Arc<HashSet<usize>>,
    scroll_height: u64,
    counters: Arc<Counters>,
}

impl FixtureRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `html` as the page served for `url`.
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.into(), html.into());
        self
    }

    /// Document height reported to the scroll loop.
    pub fn with_scroll_height(mut self, height: u64) -> Self {
        self.scroll_height = height;
        self
    }

    /// Make the n-th context request (0-based) fail to open.
    pub fn failing_context(mut self, index: usize) -> Self {
        Arc::make_mut(&mut self.failing_contexts).insert(index);
        self
    }

    /// Load `<dir>/<period>.html` for every target. Missing files are left
    /// out, so those months fail to navigate.
    pub fn from_dir(dir: &Path, targets: &[MonthTarget]) -> Result<Self> {
        if !dir.is_dir() {
            bail!("replay directory {} does not exist", dir.display());
        }
        let mut renderer = Self::new();
        for target in targets {
            let path = dir.join(format!("{}.html", target.period));
            match std::fs::read_to_string(&path) {
                Ok(html) => {
                    debug!("replaying {} from {}", target.url, path.display());
                    renderer = renderer.with_page(&target.url, html);
                }
                Err(e) => warn!("no recording for {} at {}: {e}", target.period, path.display()),
            }
        }
        Ok(renderer)
    }

    pub fn opened_contexts(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn closed_contexts(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    pub fn scroll_ticks(&self) -> usize {
        self.counters.scroll_ticks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for FixtureRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let index = self.counters.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing_contexts.contains(&index) {
            bail!("browser failed to launch (context {index})");
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FixtureContext {
            pages: Arc::clone(&self.pages),
            scroll_height: self.scroll_height,
            counters: Arc::clone(&self.counters),
            current: None,
        }))
    }
}

struct FixtureContext {
    pages: Arc<HashMap<String, String>>,
    scroll_height: u64,
    counters: Arc<Counters>,
    current: Option<String>,
}

impl FixtureContext {
    fn html(&self) -> Result<&str> {
        self.current.as_deref().ok_or_else(|| anyhow!("no page loaded"))
    }
}

#[async_trait]
impl RenderContext for FixtureContext {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
        let html = self
            .pages
            .get(url)
            .ok_or_else(|| anyhow!("net::ERR_NAME_NOT_RESOLVED at {url}"))?;
        self.current = Some(html.clone());
        Ok(NavigationResult {
            final_url: url.to_string(),
            load_time_ms: 0,
        })
    }

    async fn wait_for_selector(&self, selector: &str, _timeout_ms: u64) -> Result<()> {
        let html = self.html()?;
        let sel = scraper::Selector::parse(selector).map_err(|e| anyhow!("bad selector {selector}: {e:?}"))?;
        if scraper::Html::parse_document(html).select(&sel).next().is_none() {
            bail!("timed out waiting for {selector}");
        }
        Ok(())
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        if script.contains("scrollHeight") {
            self.counters.scroll_ticks.fetch_add(1, Ordering::SeqCst);
            return Ok(serde_json::json!(self.scroll_height));
        }
        if script.contains("innerText") {
            return Ok(serde_json::Value::String(visible_text(self.html()?)));
        }
        Ok(serde_json::Value::Null)
    }

    async fn content(&self) -> Result<String> {
        Ok(self.html()?.to_string())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
