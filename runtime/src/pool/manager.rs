//! Pool manager for browser rendering contexts.

use crate::renderer::{RenderContext, Renderer};
use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Keeps the pool's bookkeeping right for as long as a context is out.
struct Lease {
    _permit: OwnedSemaphorePermit,
    active_count: Arc<AtomicUsize>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A context borrowed from the pool. Hand it back with [`PoolManager::release`].
pub struct ContextHandle {
    context: Box<dyn RenderContext>,
    lease: Lease,
}

impl ContextHandle {
    pub fn context_mut(&mut self) -> &mut dyn RenderContext {
        self.context.as_mut()
    }
}

/// Hands out browser contexts, at most `max_contexts` at a time.
pub struct PoolManager {
    renderer: Arc<dyn Renderer>,
    semaphore: Arc<Semaphore>,
    max_contexts: usize,
    active_count: Arc<AtomicUsize>,
}

impl PoolManager {
    pub fn new(renderer: Arc<dyn Renderer>, max_contexts: usize) -> Self {
        let max_contexts = max_contexts.max(1);
        Self {
            renderer,
            semaphore: Arc::new(Semaphore::new(max_contexts)),
            max_contexts,
            active_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Open a context, waiting while the pool is full.
    ///
    /// If the renderer fails to open a context, the slot is freed again and
    /// nothing needs releasing.
    pub async fn acquire(&self) -> Result<ContextHandle> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| anyhow!("browser pool closed: {e}"))?;

        let context = self.renderer.new_context().await?;
        self.active_count.fetch_add(1, Ordering::SeqCst);

        Ok(ContextHandle {
            context,
            lease: Lease {
                _permit: permit,
                active_count: Arc::clone(&self.active_count),
            },
        })
    }

    /// Close the context and free its slot, even if closing fails.
    pub async fn release(&self, handle: ContextHandle) -> Result<()> {
        let ContextHandle { context, lease } = handle;
        let closed = context.close().await;
        drop(lease);
        closed
    }

    pub fn active(&self) -> usize {
        self.active_count.load(Ordering::SeqCst)
    }

    pub fn max_contexts(&self) -> usize {
        self.max_contexts
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
