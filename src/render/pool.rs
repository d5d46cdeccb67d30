// SPDX-License-Identifier: PMPL-1.0-or-later
//! Bounded browser pool
//!
//! Browser instances are expensive (CPU and RAM per process), so at most
//! `capacity` renders run at once. Excess requests wait on a fair semaphore,
//! which hands out permits in FIFO order. The wait happens in `reserve`,
//! ahead of the navigation timeout, so queueing never counts as a slow page. Each unit of work gets its own
//! browser process and profile, so concurrent analyses share no state.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;
use url::Url;

use super::{AnalysisMethod, Renderer};
use crate::error::{Error, Result};

/// Renderer wrapper limiting concurrent browser work
pub struct BrowserPool {
    renderer: Arc<dyn Renderer>,
    permits: Arc<Semaphore>,
    capacity: usize,
    /// Requests currently queued for a slot
    waiting: Arc<AtomicUsize>,
}

/// Pool occupancy snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PoolStats {
    pub capacity: usize,
    pub available: usize,
    pub waiting: usize,
}

impl BrowserPool {
    pub fn new(renderer: impl Renderer + 'static, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        debug!("Browser pool initialized: capacity={}", capacity);

        Self {
            renderer: Arc::new(renderer),
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            waiting: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait for a free slot
    ///
    /// The returned permit frees the slot when dropped, including when the
    /// render holding it fails or is cancelled.
    pub async fn acquire(&self) -> Result<PoolPermit> {
        let _queued = WaitGuard::enter(&self.waiting);

        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| Error::Internal("browser pool closed".to_string()))?;

        debug!(
            "Browser slot acquired ({}/{} free)",
            self.permits.available_permits(),
            self.capacity
        );

        Ok(PoolPermit { _permit: permit })
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity,
            available: self.permits.available_permits(),
            waiting: self.waiting.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl Renderer for BrowserPool {
    fn method(&self) -> AnalysisMethod {
        AnalysisMethod::BrowserPool
    }

    async fn reserve(&self) -> Result<Option<PoolPermit>> {
        self.acquire().await.map(Some)
    }

    /// Runs inside a slot the caller already holds from `reserve`
    async fn render(&self, url: &Url) -> Result<String> {
        self.renderer.render(url).await
    }
}

/// RAII slot that releases automatically when dropped
pub struct PoolPermit {
    _permit: OwnedSemaphorePermit,
}

impl Drop for PoolPermit {
    fn drop(&mut self) {
        debug!("Browser slot released");
    }
}

/// Counts a request as queued until it gets a slot or is cancelled
struct WaitGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> WaitGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self { counter }
    }
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::Relaxed);
    }
}
