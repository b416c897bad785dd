//! Allow-list store.
//!
//! An allow list is a set of identifiers (shop ids) permitted to bypass a
//! default restriction. Each row's key is one identifier.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::cache::{Refreshable, RowSource, SnapshotCache, fetch_all};
use crate::error::EngineResult;

/// Row-source domain of shops exempt from the hidden fee.
pub const HIDDEN_FEE_EXEMPT_DOMAIN: &str = "hidden_fee_exempt_shop";

/// Cache of one identifier allow list.
pub struct AllowListStore {
    source: Arc<dyn RowSource>,
    batch_size: usize,
    snapshot: SnapshotCache<HashSet<String>>,
}

impl AllowListStore {
    /// Creates an empty allow list for `domain`.
    pub fn new(domain: &str, source: Arc<dyn RowSource>, batch_size: usize) -> Self {
        Self {
            source,
            batch_size,
            snapshot: SnapshotCache::new(domain),
        }
    }

    /// Returns true if `id` is on the list.
    ///
    /// Nothing is allow-listed until the first snapshot is published.
    pub fn exists(&self, id: &str) -> bool {
        self.snapshot
            .load()
            .map(|ids| ids.contains(id.trim()))
            .unwrap_or(false)
    }

    /// Returns the number of listed identifiers.
    pub fn len(&self) -> usize {
        self.snapshot.load().map(|ids| ids.len()).unwrap_or(0)
    }

    /// Returns true if nothing is listed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true once the first snapshot has been published.
    pub fn is_ready(&self) -> bool {
        self.snapshot.is_ready()
    }
}

#[async_trait]
impl Refreshable for AllowListStore {
    fn domain(&self) -> &str {
        self.snapshot.domain()
    }

    async fn refresh(&self) -> EngineResult<usize> {
        let rows = fetch_all(self.source.as_ref(), self.snapshot.domain(), self.batch_size).await?;
        let ids: HashSet<String> = rows
            .into_iter()
            .map(|row| row.key.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();

        let count = ids.len();
        let generation = self.snapshot.publish(ids);
        info!(domain = %self.snapshot.domain(), generation, count, "Published allow list");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{InMemoryRowSource, RawConfigRow};

    fn id_row(id: u64, key: &str) -> RawConfigRow {
        RawConfigRow {
            id,
            key: key.to_string(),
            value: String::new(),
        }
    }

    #[tokio::test]
    async fn test_exists_after_refresh() {
        let source = Arc::new(InMemoryRowSource::new());
        source
            .replace(
                HIDDEN_FEE_EXEMPT_DOMAIN,
                vec![id_row(1, "1001"), id_row(2, " 1002 "), id_row(3, "")],
            )
            .await;
        let store = AllowListStore::new(HIDDEN_FEE_EXEMPT_DOMAIN, source, 2);

        assert!(!store.exists("1001"));
        assert_eq!(store.refresh().await.unwrap(), 2);

        assert!(store.exists("1001"));
        assert!(store.exists("1002"));
        assert!(!store.exists("1003"));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_replaces_whole_set() {
        let source = Arc::new(InMemoryRowSource::new());
        source
            .replace(HIDDEN_FEE_EXEMPT_DOMAIN, vec![id_row(1, "1001")])
            .await;
        let store = AllowListStore::new(HIDDEN_FEE_EXEMPT_DOMAIN, source.clone(), 10);
        store.refresh().await.unwrap();

        source
            .replace(HIDDEN_FEE_EXEMPT_DOMAIN, vec![id_row(2, "2002")])
            .await;
        store.refresh().await.unwrap();

        assert!(!store.exists("1001"));
        assert!(store.exists("2002"));
    }
}
