//! Warm-up and background refresh of configuration caches.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::CacheSettings;
use crate::error::{EngineError, EngineResult};

/// A cache that can rebuild and republish its snapshot from the backing store.
#[async_trait]
pub trait Refreshable: Send + Sync {
    /// The cache domain, used in logs.
    fn domain(&self) -> &str;

    /// Rebuilds the snapshot and publishes it, returning the number of entries.
    ///
    /// On error the previously published snapshot must stay untouched.
    async fn refresh(&self) -> EngineResult<usize>;
}

/// Drives one [`Refreshable`] through warm-up and periodic refresh.
///
/// States: initializing until [`warm_up`](Self::warm_up) succeeds, then
/// ready; the spawned loop refreshes every `refresh_interval` and retries
/// after `retry_backoff` when a refresh fails.
///
/// # Example
///
/// ```ignore
/// let refresher = CacheRefresher::new(store, &settings.cache, cancel.clone());
/// refresher.warm_up().await?;
/// let handle = refresher.spawn();
/// // ...
/// cancel.cancel();
/// handle.await?;
/// ```
pub struct CacheRefresher {
    target: Arc<dyn Refreshable>,
    refresh_interval: Duration,
    retry_backoff: Duration,
    cancel: CancellationToken,
}

impl CacheRefresher {
    /// Creates a refresher using the cadence from `settings`.
    pub fn new(
        target: Arc<dyn Refreshable>,
        settings: &CacheSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self::with_intervals(
            target,
            settings.refresh_interval(),
            settings.retry_backoff(),
            cancel,
        )
    }

    /// Creates a refresher with explicit intervals.
    pub fn with_intervals(
        target: Arc<dyn Refreshable>,
        refresh_interval: Duration,
        retry_backoff: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            target,
            refresh_interval,
            retry_backoff,
            cancel,
        }
    }

    /// Refreshes until the first success.
    ///
    /// Failures are logged and retried after the backoff. Returns
    /// `CacheNotReady` only when cancelled before any refresh succeeded.
    pub async fn warm_up(&self) -> EngineResult<()> {
        let domain = self.target.domain().to_string();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let outcome = tokio::select! {
                outcome = self.target.refresh() => outcome,
                _ = self.cancel.cancelled() => {
                    return Err(EngineError::CacheNotReady { domain });
                }
            };

            match outcome {
                Ok(entries) => {
                    info!(domain = %domain, entries, attempt, "Cache warmed up");
                    return Ok(());
                }
                Err(err) => {
                    warn!(domain = %domain, attempt, error = %err, "Cache warm-up failed, retrying");
                }
            }

            tokio::select! {
                _ = time::sleep(self.retry_backoff) => {}
                _ = self.cancel.cancelled() => {
                    return Err(EngineError::CacheNotReady { domain });
                }
            }
        }
    }

    /// Spawns the periodic refresh loop.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(self) {
        let domain = self.target.domain().to_string();
        let mut delay = self.refresh_interval;

        loop {
            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = self.cancel.cancelled() => {
                    debug!(domain = %domain, "Cache refresh loop stopped");
                    return;
                }
            }

            let outcome = tokio::select! {
                outcome = self.target.refresh() => outcome,
                _ = self.cancel.cancelled() => {
                    debug!(domain = %domain, "Cache refresh loop stopped");
                    return;
                }
            };

            delay = match outcome {
                Ok(entries) => {
                    debug!(domain = %domain, entries, "Cache refreshed");
                    self.refresh_interval
                }
                Err(err) => {
                    warn!(
                        domain = %domain,
                        error = %err,
                        retry_in_ms = self.retry_backoff.as_millis() as u64,
                        "Cache refresh failed, keeping previous snapshot"
                    );
                    self.retry_backoff
                }
            };
        }
    }
}
