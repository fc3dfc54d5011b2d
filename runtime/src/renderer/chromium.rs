//! Chromium-backed renderer using the DevTools protocol.
//!
//! Each context launches its own browser process, so a month's page never
//! shares cookies or cache with the previous one. Closing the context closes
//! the browser and stops its event handler task.

use super::{NavigationResult, RenderContext, Renderer};
use crate::stealth::fingerprint::{LAUNCH_ARGS, STEALTH_SCRIPT, USER_AGENT};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, EventLifecycleEvent, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::Page;
use futures::{Stream, StreamExt};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Environment variable naming an explicit Chromium executable.
pub const CHROMIUM_PATH_ENV: &str = "SALESRANK_CHROMIUM_PATH";

/// Interval between polls while waiting for a selector.
const SELECTOR_POLL: Duration = Duration::from_millis(100);

/// Lifecycle event fired once the page has had no requests in flight for 500ms.
const NETWORK_IDLE: &str = "networkIdle";

/// Sent with every request alongside the user agent.
const ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9,en;q=0.8";

/// Launch settings for [`ChromiumRenderer`].
#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    pub executable: Option<PathBuf>,
    /// Show the browser window instead of running headless.
    pub headed: bool,
    pub user_agent: String,
}

impl Default for ChromiumOptions {
    fn default() -> Self {
        Self {
            executable: None,
            headed: false,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// Locate a Chromium executable: the env override first, then `PATH`.
pub fn find_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var(CHROMIUM_PATH_ENV) {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
        warn!("{CHROMIUM_PATH_ENV}={p} does not exist, searching PATH");
    }

    for name in ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let local = home.join(".cache/salesrank/chromium/chrome");
        if local.exists() {
            return Some(local);
        }
    }

    None
}

/// Launches one Chromium process per context.
pub struct ChromiumRenderer {
    options: ChromiumOptions,
}

impl ChromiumRenderer {
    pub fn new(mut options: ChromiumOptions) -> Self {
        if options.executable.is_none() {
            options.executable = find_chromium();
        }
        Self { options }
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder().args(LAUNCH_ARGS.iter().copied());
        if let Some(exe) = &self.options.executable {
            builder = builder.chrome_executable(exe);
        }
        if self.options.headed {
            builder = builder.with_head();
        }
        builder.build().map_err(|e| anyhow!("invalid browser config: {e}"))
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let config = self.browser_config()?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("launching chromium")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match open_page(&browser, &self.options.user_agent).await {
            Ok(page) => page,
            Err(e) => {
                let context = ChromiumContext {
                    browser,
                    page: None,
                    handler_task,
                };
                if let Err(close_err) = Box::new(context).close().await {
                    warn!("closing half-open browser: {close_err:#}");
                }
                return Err(e);
            }
        };

        info!("browser context ready");
        Ok(Box::new(ChromiumContext {
            browser,
            page: Some(page),
            handler_task,
        }))
    }
}

async fn open_page(browser: &Browser, user_agent: &str) -> Result<Page> {
    let page = browser.new_page("about:blank").await.context("opening page")?;
    page.set_user_agent(user_agent_override(user_agent))
        .await
        .context("setting user agent")?;
    page.execute(SetLifecycleEventsEnabledParams::new(true))
        .await
        .context("enabling lifecycle events")?;
    page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
        .await
        .context("installing stealth script")?;
    Ok(page)
}

fn user_agent_override(user_agent: &str) -> SetUserAgentOverrideParams {
    let mut params = SetUserAgentOverrideParams::new(user_agent);
    params.accept_language = Some(ACCEPT_LANGUAGE.to_string());
    params
}

/// Consume lifecycle event names until `networkIdle`. Returns false if the
/// stream ends first.
async fn wait_for_network_idle(events: impl Stream<Item = String>) -> bool {
    futures::pin_mut!(events);
    while let Some(name) = events.next().await {
        if name == NETWORK_IDLE {
            return true;
        }
    }
    false
}

struct ChromiumContext {
    browser: Browser,
    page: Option<Page>,
    handler_task: JoinHandle<()>,
}

impl ChromiumContext {
    fn page(&self) -> Result<&Page> {
        self.page.as_ref().ok_or_else(|| anyhow!("page is not open"))
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let page = self.page()?;
        let start = Instant::now();

        // Subscribe before navigating so an early idle event is not missed.
        let lifecycle = page
            .event_listener::<EventLifecycleEvent>()
            .await
            .context("subscribing to lifecycle events")?
            .map(|event| event.name.clone());

        let loaded = async {
            page.goto(url).await.with_context(|| format!("loading {url}"))?;
            if !wait_for_network_idle(lifecycle).await {
                warn!("lifecycle events stopped before {url} went idle");
            }
            Ok::<_, anyhow::Error>(())
        };
        tokio::time::timeout(Duration::from_millis(timeout_ms), loaded)
            .await
            .map_err(|_| anyhow!("network not idle after {timeout_ms}ms"))??;

        let final_url = page.url().await?.unwrap_or_else(|| url.to_string());
        Ok(NavigationResult {
            final_url,
            load_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let page = self.page()?;
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                bail!("timed out after {timeout_ms}ms waiting for {selector}");
            }
            tokio::time::sleep(SELECTOR_POLL).await;
        }
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page()?
            .evaluate(script)
            .await
            .context("evaluating script")?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn content(&self) -> Result<String> {
        self.page()?.content().await.context("reading page html")
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let ChromiumContext {
            mut browser,
            page,
            handler_task,
        } = *self;
        drop(page);

        let closed = browser.close().await.context("closing browser");
        if let Err(e) = browser.wait().await {
            debug!("waiting for browser exit: {e}");
        }
        handler_task.abort();
        closed.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> impl Stream<Item = String> {
        futures::stream::iter(list.iter().map(|n| n.to_string()).collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn test_waits_past_load_for_network_idle() {
        let events = names(&["init", "DOMContentLoaded", "load", "networkAlmostIdle", "networkIdle"]);
        assert!(wait_for_network_idle(events).await);
    }

    #[tokio::test]
    async fn test_almost_idle_is_not_enough() {
        assert!(!wait_for_network_idle(names(&["init", "load", "networkAlmostIdle"])).await);
    }

    #[test]
    fn test_user_agent_override() {
        let params = user_agent_override(USER_AGENT);
        assert_eq!(params.user_agent, USER_AGENT);
        assert_eq!(params.accept_language.as_deref(), Some(ACCEPT_LANGUAGE));
    }
}
