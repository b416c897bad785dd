//! Capability interfaces the pricing service calls out to.
//!
//! Implementations wrap the shop, item, exchange-rate and merchant services
//! and the relational store. None of them are retried by the engine.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::EngineResult;
use crate::models::{AffiliateItemRecord, PlatformFees};

/// Supplies the externally-owned pricing factors.
#[async_trait]
pub trait FactorResolver: Send + Sync {
    /// Margin configured for an affiliate shop.
    async fn shop_margin(&self, shop_id: u64) -> EngineResult<Decimal>;

    /// Exchange rate converting `from` currency into `to` currency.
    async fn exchange_rate(&self, from: &str, to: &str) -> EngineResult<Decimal>;

    /// Margin configured for a primary/affiliate region pair.
    async fn country_margin(
        &self,
        primary_region: &str,
        affiliate_region: &str,
    ) -> EngineResult<Decimal>;

    /// Cross-border platform fees of an affiliate shop.
    async fn platform_fees(&self, shop_id: u64) -> EngineResult<PlatformFees>;

    /// Local platform fees of a shop.
    ///
    /// `service_fee` carries the reference service fee and `handling_fee`
    /// the transaction fee.
    async fn local_fees(&self, shop_id: u64) -> EngineResult<PlatformFees>;
}

/// Read access to affiliate item mapping records.
#[async_trait]
pub trait AffiliateItemRepository: Send + Sync {
    /// Returns every record stored for `affiliate_item_id`, duplicates included.
    async fn find_by_affiliate_item(
        &self,
        affiliate_item_id: u64,
    ) -> EngineResult<Vec<AffiliateItemRecord>>;
}

/// Write-only sink for pricing overrides.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Stores the margin of an affiliate shop.
    async fn upsert_shop_margin(&self, shop_id: u64, margin: Decimal) -> EngineResult<()>;

    /// Stores the margin of an affiliate item.
    async fn upsert_item_margin(&self, affiliate_item_id: u64, margin: Decimal)
    -> EngineResult<()>;

    /// Stores the declared real weight of an affiliate item.
    async fn upsert_item_real_weight(
        &self,
        affiliate_item_id: u64,
        weight_grams: i64,
    ) -> EngineResult<()>;

    /// Links an affiliate item to a promotion.
    async fn upsert_promotion_id(&self, affiliate_item_id: u64, promotion_id: u64)
    -> EngineResult<()>;
}
