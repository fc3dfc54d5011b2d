//! Page rendering: browser contexts and fully scrolled document snapshots.
//!
//! A [`Renderer`] hands out [`RenderContext`]s; [`render_page`] drives one
//! context through navigation, lazy-load scrolling and a settle wait, then
//! captures a [`DocumentSnapshot`]. The Chromium implementation lives in
//! [`chromium`]; [`fixture`] serves recorded pages for replay and tests.

pub mod chromium;
pub mod fixture;

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Node, Selector};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Outcome of a navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    pub final_url: String,
    pub load_time_ms: u64,
}

/// Creates browser contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Open a fresh context (browser + page) ready to navigate.
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
}

/// A single browser page.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Load `url` and wait until the network is idle, failing after `timeout_ms`.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;

    /// Wait until `selector` matches an element, or fail after `timeout_ms`.
    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()>;

    /// Evaluate a JavaScript expression and return its JSON value.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;

    /// Serialized HTML of the current document.
    async fn content(&self) -> Result<String>;

    /// Release the context and everything it owns.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Timing knobs for [`render_page`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub navigate_timeout_ms: u64,
    pub selector_timeout_ms: u64,
    /// Pixels advanced per scroll tick.
    pub scroll_step_px: u64,
    pub scroll_tick_ms: u64,
    /// Upper bound on scroll ticks, for pages that grow forever.
    pub max_scroll_ticks: u32,
    /// Quiet period after scrolling before the snapshot is taken.
    pub settle_ms: u64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            navigate_timeout_ms: 30_000,
            selector_timeout_ms: 10_000,
            scroll_step_px: 100,
            scroll_tick_ms: 100,
            max_scroll_ticks: 2_000,
            settle_ms: 5_000,
        }
    }
}

impl RenderOptions {
    /// No waiting at all; used when replaying recorded pages.
    pub fn immediate() -> Self {
        Self {
            scroll_tick_ms: 0,
            settle_ms: 0,
            ..Self::default()
        }
    }
}

/// A rendered page: markup plus the text a reader would see.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub url: String,
    pub html: String,
    /// Rendered text of `<body>`, one line per text node.
    pub text: String,
}

impl DocumentSnapshot {
    /// Build a snapshot from raw HTML, deriving the visible text locally.
    pub fn from_html(url: impl Into<String>, html: impl Into<String>) -> Self {
        let html = html.into();
        let text = visible_text(&html);
        Self {
            url: url.into(),
            html,
            text,
        }
    }
}

/// Join the text nodes of `<body>` with newlines, skipping script and style.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(body_sel) = Selector::parse("body") else {
        return String::new();
    };
    let Some(body) = document.select(&body_sel).next() else {
        return String::new();
    };

    let mut lines = Vec::new();
    for node in body.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| matches!(e.name(), "script" | "style" | "noscript")))
            .unwrap_or(false);
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }
    lines.join("\n")
}

const INNER_TEXT_SCRIPT: &str = "document.body ? document.body.innerText : ''";

/// Navigate, wait for `body`, scroll to the bottom, settle, then snapshot.
pub async fn render_page(
    context: &mut dyn RenderContext,
    url: &str,
    options: &RenderOptions,
) -> Result<DocumentSnapshot> {
    let nav = context
        .navigate(url, options.navigate_timeout_ms)
        .await
        .with_context(|| format!("navigating to {url}"))?;
    debug!("loaded {} in {}ms", nav.final_url, nav.load_time_ms);

    context
        .wait_for_selector("body", options.selector_timeout_ms)
        .await
        .context("waiting for body")?;

    let ticks = auto_scroll(context, options).await.context("scrolling page")?;
    debug!("scrolled {url} in {ticks} ticks");

    if options.settle_ms > 0 {
        tokio::time::sleep(Duration::from_millis(options.settle_ms)).await;
    }

    let html = context.content().await.context("reading page content")?;
    let text = match context.execute_js(INNER_TEXT_SCRIPT).await? {
        serde_json::Value::String(s) => s,
        _ => visible_text(&html),
    };

    Ok(DocumentSnapshot {
        url: nav.final_url,
        html,
        text,
    })
}

/// Scroll by a fixed step each tick until the distance covered reaches the
/// document height. Returns the number of ticks taken.
pub async fn auto_scroll(context: &dyn RenderContext, options: &RenderOptions) -> Result<u32> {
    let script = format!(
        "(() => {{ const h = document.body.scrollHeight; window.scrollBy(0, {}); return h; }})()",
        options.scroll_step_px
    );
    let started = Instant::now();
    let mut scrolled = 0u64;
    let mut ticks = 0u32;

    loop {
        let height = context
            .execute_js(&script)
            .await?
            .as_f64()
            .map(|h| h.max(0.0) as u64)
            .unwrap_or(0);
        scrolled += options.scroll_step_px;
        ticks += 1;

        if scrolled >= height || ticks >= options.max_scroll_ticks {
            break;
        }
        if options.scroll_tick_ms > 0 {
            tokio::time::sleep(Duration::from_millis(options.scroll_tick_ms)).await;
        }
    }

    debug!("scrolled {scrolled}px in {}ms", started.elapsed().as_millis());
    Ok(ticks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::fixture::FixtureRenderer;

    #[test]
    fn test_visible_text_skips_scripts() {
        let html = r#"<html><head><title>t</title></head><body>
            <div><span>1</span><span>比亚迪</span><span>380000</span></div>
            <script>var x = 1;</script>
        </body></html>"#;
        assert_eq!(visible_text(html), "1\n比亚迪\n380000");
    }

    #[tokio::test]
    async fn test_render_page_scrolls_to_height() {
        let url = "https://example.com/rank/2025-04.html";
        let renderer = FixtureRenderer::new()
            .with_page(url, "<html><body><p>hello</p></body></html>")
            .with_scroll_height(1_050);
        let mut ctx = renderer.new_context().await.unwrap();

        let snapshot = render_page(ctx.as_mut(), url, &RenderOptions::immediate()).await.unwrap();
        assert_eq!(snapshot.url, url);
        assert_eq!(snapshot.text, "hello");
        // 100px steps: 11 ticks to cover 1050px.
        assert_eq!(renderer.scroll_ticks(), 11);
        ctx.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_scroll_stops_at_tick_cap() {
        let url = "https://example.com/rank/2025-04.html";
        let renderer = FixtureRenderer::new()
            .with_page(url, "<html><body></body></html>")
            .with_scroll_height(u32::MAX as u64);
        let mut ctx = renderer.new_context().await.unwrap();
        ctx.navigate(url, 1_000).await.unwrap();

        let options = RenderOptions {
            max_scroll_ticks: 5,
            ..RenderOptions::immediate()
        };
        assert_eq!(auto_scroll(ctx.as_ref(), &options).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_render_unknown_url_fails() {
        let renderer = FixtureRenderer::new();
        let mut ctx = renderer.new_context().await.unwrap();
        let err = render_page(ctx.as_mut(), "https://example.com/missing", &RenderOptions::immediate())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("navigating to"));
    }
}
