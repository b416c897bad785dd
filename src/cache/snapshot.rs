//! Atomically published snapshots.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwapOption;

use crate::error::{EngineError, EngineResult};

/// Holds the currently published snapshot of one cache domain.
///
/// The snapshot starts empty and only becomes readable after the first
/// [`publish`](Self::publish). Publication swaps the whole `Arc`, so a
/// reader sees either the previous or the new snapshot, never a mix.
///
/// # Example
///
/// ```
/// use sip_price_engine::cache::SnapshotCache;
///
/// let cache: SnapshotCache<Vec<u32>> = SnapshotCache::new("numbers");
/// assert!(cache.load().is_err());
///
/// cache.publish(vec![1, 2, 3]);
/// assert_eq!(cache.load().unwrap().len(), 3);
/// assert_eq!(cache.generation(), 1);
/// ```
#[derive(Debug)]
pub struct SnapshotCache<T> {
    domain: String,
    current: ArcSwapOption<T>,
    generation: AtomicU64,
}

impl<T> SnapshotCache<T> {
    /// Creates an empty cache for `domain`.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            current: ArcSwapOption::empty(),
            generation: AtomicU64::new(0),
        }
    }

    /// Returns the cache domain.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the current snapshot, or `CacheNotReady` before the first publish.
    pub fn load(&self) -> EngineResult<Arc<T>> {
        self.current
            .load_full()
            .ok_or_else(|| EngineError::CacheNotReady {
                domain: self.domain.clone(),
            })
    }

    /// Replaces the current snapshot and returns the new generation number.
    pub fn publish(&self, snapshot: T) -> u64 {
        self.current.store(Some(Arc::new(snapshot)));
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Returns true once a snapshot has been published.
    pub fn is_ready(&self) -> bool {
        self.current.load().is_some()
    }

    /// Returns how many snapshots have been published.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
