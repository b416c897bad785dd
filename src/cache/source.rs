//! Backing-store row access for cache refreshes.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{EngineError, EngineResult};

/// One raw configuration row as stored by the backing store.
///
/// `key` groups rows (a rule key, a shop id, ...) and `value` carries the
/// domain-specific payload, usually JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConfigRow {
    /// Auto-increment identifier.
    pub id: u64,
    /// Grouping key.
    pub key: String,
    /// Encoded payload.
    pub value: String,
}

/// Paged access to the configuration rows of a domain.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Returns up to `limit` rows of `domain` with `id >= lower_bound_id`, ascending by id.
    async fn fetch_batch(
        &self,
        domain: &str,
        lower_bound_id: u64,
        limit: usize,
    ) -> EngineResult<Vec<RawConfigRow>>;
}

/// Fetches every row of `domain` in batches of `batch_size`.
///
/// Each page starts at the id following the last row of the previous page;
/// a page shorter than `batch_size` ends the scan.
pub async fn fetch_all(
    source: &dyn RowSource,
    domain: &str,
    batch_size: usize,
) -> EngineResult<Vec<RawConfigRow>> {
    if batch_size == 0 {
        return Err(EngineError::invalid("batch_size", "must be positive"));
    }

    let mut rows = Vec::new();
    let mut lower_bound_id = 0u64;

    loop {
        let batch = source.fetch_batch(domain, lower_bound_id, batch_size).await?;
        let fetched = batch.len();
        let mut ids_exhausted = false;

        if let Some(last) = batch.last() {
            if last.id < lower_bound_id {
                return Err(EngineError::invariant(format!(
                    "row source for '{}' returned id {} below lower bound {}",
                    domain, last.id, lower_bound_id
                )));
            }
            match last.id.checked_add(1) {
                Some(next) => lower_bound_id = next,
                None => ids_exhausted = true,
            }
        }
        rows.extend(batch);

        if fetched < batch_size || ids_exhausted {
            break;
        }
    }

    tracing::debug!(domain, rows = rows.len(), "Fetched configuration rows");
    Ok(rows)
}

/// A [`RowSource`] backed by memory, used for seeding and tests.
#[derive(Debug, Default)]
pub struct InMemoryRowSource {
    domains: RwLock<HashMap<String, Vec<RawConfigRow>>>,
}

impl InMemoryRowSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all rows of `domain`.
    pub async fn replace(&self, domain: &str, mut rows: Vec<RawConfigRow>) {
        rows.sort_by_key(|row| row.id);
        self.domains.write().await.insert(domain.to_string(), rows);
    }
}

#[async_trait]
impl RowSource for InMemoryRowSource {
    async fn fetch_batch(
        &self,
        domain: &str,
        lower_bound_id: u64,
        limit: usize,
    ) -> EngineResult<Vec<RawConfigRow>> {
        let domains = self.domains.read().await;
        Ok(domains
            .get(domain)
            .map(|rows| {
                rows.iter()
                    .filter(|row| row.id >= lower_bound_id)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
