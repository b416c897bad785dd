//! Affiliate item mapping record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A row describing an affiliate item's pricing overrides.
///
/// Upstream storage is expected to hold one row per affiliate item, but
/// duplicates do occur; see [`crate::calculation::select_latest_record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliateItemRecord {
    /// Auto-increment row identifier.
    pub id: u64,
    /// The affiliate item identifier.
    pub affiliate_item_id: u64,
    /// The linked primary item identifier.
    pub primary_item_id: u64,
    /// Item-level margin as a fraction (e.g. `0.02`).
    pub item_margin: Decimal,
    /// Declared real shipping weight in grams, if set.
    pub real_weight: Option<i64>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
}
