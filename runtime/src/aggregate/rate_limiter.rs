//! Rate limiter for polite scraping.
//!
//! The delay is measured from the moment the previous request finished
//! (its guard was dropped), so a slow page does not eat into the pause.
//! The first request is never delayed. Concurrency is capped separately by
//! the context pool.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Enforces a minimum pause between requests.
pub struct RateLimiter {
    min_delay: Duration,
    last_finished: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    /// `min_delay_ms`: pause between one request finishing and the next starting.
    pub fn new(min_delay_ms: u64) -> Self {
        Self {
            min_delay: Duration::from_millis(min_delay_ms),
            last_finished: Arc::new(Mutex::new(None)),
        }
    }

    /// How long the next caller would have to wait right now.
    pub fn pending_delay(&self) -> Duration {
        let last = *self.last_finished.lock().unwrap_or_else(|e| e.into_inner());
        match last {
            Some(t) => self.min_delay.saturating_sub(t.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Wait for the pause since the previous request to elapse.
    pub async fn acquire(&self) -> RateLimitGuard {
        let wait = self.pending_delay();
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        RateLimitGuard {
            last_finished: Arc::clone(&self.last_finished),
        }
    }
}

/// Marks the request finished when dropped.
pub struct RateLimitGuard {
    last_finished: Arc<Mutex<Option<Instant>>>,
}

impl Drop for RateLimitGuard {
    fn drop(&mut self) {
        let mut last = self.last_finished.lock().unwrap_or_else(|e| e.into_inner());
        *last = Some(Instant::now());
    }
}
