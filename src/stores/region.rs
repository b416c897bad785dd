//! Region rate store.
//!
//! The region table is stored as one JSON blob mapping a source region to
//! destination regions and their [`RegionRate`]. The most recent row of
//! the domain wins.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::{Refreshable, RowSource, SnapshotCache, fetch_all};
use crate::error::{EngineError, EngineResult};

/// Row-source domain of the region rate table.
pub const REGION_RATE_DOMAIN: &str = "region_rate";

/// Pricing descriptor for one source/destination region pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRate {
    /// Primary to affiliate pricing multiplier.
    pub price_ratio: Decimal,
    /// Free-form note.
    #[serde(default)]
    pub description: String,
}

/// Source region → destination region → rate.
pub type RegionTable = HashMap<String, HashMap<String, RegionRate>>;

/// Decodes a region table blob, normalizing region codes to upper case.
///
/// A region pair that repeats after normalization is rejected.
pub fn decode_region_table(blob: &str) -> EngineResult<RegionTable> {
    let raw: RegionTable = serde_json::from_str(blob)
        .map_err(|e| EngineError::invariant(format!("region rate blob does not decode: {}", e)))?;

    let mut table = RegionTable::with_capacity(raw.len());
    for (source, destinations) in raw {
        let entry: &mut HashMap<String, RegionRate> =
            table.entry(source.to_ascii_uppercase()).or_default();
        for (destination, rate) in destinations {
            if rate.price_ratio <= Decimal::ZERO {
                return Err(EngineError::invariant(format!(
                    "region rate {}->{} has non-positive price ratio {}",
                    source, destination, rate.price_ratio
                )));
            }
            let destination = destination.to_ascii_uppercase();
            if entry.insert(destination.clone(), rate).is_some() {
                return Err(EngineError::invariant(format!(
                    "region rate {}->{} is defined more than once",
                    source.to_ascii_uppercase(),
                    destination
                )));
            }
        }
    }

    Ok(table)
}

/// Cache of the region rate table.
pub struct RegionStore {
    source: Arc<dyn RowSource>,
    batch_size: usize,
    snapshot: SnapshotCache<RegionTable>,
}

impl RegionStore {
    /// Creates an empty store reading from `source`.
    pub fn new(source: Arc<dyn RowSource>, batch_size: usize) -> Self {
        Self {
            source,
            batch_size,
            snapshot: SnapshotCache::new(REGION_RATE_DOMAIN),
        }
    }

    /// Returns the rate for a region pair.
    pub fn rate(&self, source: &str, destination: &str) -> EngineResult<Option<RegionRate>> {
        let table = self.snapshot.load()?;
        Ok(table
            .get(&source.to_ascii_uppercase())
            .and_then(|destinations| destinations.get(&destination.to_ascii_uppercase()))
            .cloned())
    }

    /// Returns the published table.
    pub fn snapshot(&self) -> EngineResult<Arc<RegionTable>> {
        self.snapshot.load()
    }

    /// Returns true once the first table has been published.
    pub fn is_ready(&self) -> bool {
        self.snapshot.is_ready()
    }
}

#[async_trait]
impl Refreshable for RegionStore {
    fn domain(&self) -> &str {
        self.snapshot.domain()
    }

    async fn refresh(&self) -> EngineResult<usize> {
        let rows = fetch_all(self.source.as_ref(), REGION_RATE_DOMAIN, self.batch_size).await?;
        let latest = rows
            .iter()
            .max_by_key(|row| row.id)
            .ok_or_else(|| EngineError::invariant("region rate blob is missing"))?;

        let table = decode_region_table(&latest.value)?;
        let pairs: usize = table.values().map(HashMap::len).sum();
        let generation = self.snapshot.publish(table);
        info!(domain = REGION_RATE_DOMAIN, generation, pairs, row_id = latest.id, "Published region table");
        Ok(pairs)
    }
}
