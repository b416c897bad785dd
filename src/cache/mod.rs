//! Periodically refreshed configuration caches.
//!
//! A cache owns an immutable snapshot that is replaced wholesale on every
//! refresh. Readers take an `Arc` of the current snapshot without locking;
//! the refresh task is the only writer. See [`CacheRefresher`] for the
//! warm-up and refresh loop.

mod refresher;
mod snapshot;
mod source;
mod tiered;

pub use refresher::{CacheRefresher, Refreshable};
pub use snapshot::SnapshotCache;
pub use source::{InMemoryRowSource, RawConfigRow, RowSource, fetch_all};
pub use tiered::{RateTier, RuleSet, TieredRateCache};
