//! In-memory collaborators for seeding and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::error::{EngineError, EngineResult};
use crate::models::{AffiliateItemRecord, PlatformFees};

use super::collaborators::{AffiliateItemRepository, FactorResolver, PersistenceSink};

#[derive(Debug, Default)]
struct Tables {
    shop_margins: HashMap<u64, Decimal>,
    exchange_rates: HashMap<(String, String), Decimal>,
    country_margins: HashMap<(String, String), Decimal>,
    platform_fees: HashMap<u64, PlatformFees>,
    local_fees: HashMap<u64, PlatformFees>,
    records: HashMap<u64, Vec<AffiliateItemRecord>>,
    promotions: HashMap<u64, u64>,
    next_record_id: u64,
}

impl Tables {
    /// Returns the most recent record of an item, creating an empty one if none exists.
    fn latest_record_mut(&mut self, affiliate_item_id: u64) -> &mut AffiliateItemRecord {
        let records = self.records.entry(affiliate_item_id).or_default();
        if records.is_empty() {
            self.next_record_id += 1;
            records.push(AffiliateItemRecord {
                id: self.next_record_id,
                affiliate_item_id,
                primary_item_id: 0,
                item_margin: Decimal::ZERO,
                real_weight: None,
                created_at: Utc::now(),
            });
        }

        let index = records
            .iter()
            .enumerate()
            .max_by_key(|(_, r)| (r.created_at, r.id))
            .map(|(i, _)| i)
            .unwrap_or(0);
        &mut records[index]
    }
}

/// Implements every collaborator interface over in-memory tables.
///
/// Lookups of values that were never stored fail with `NotFound`.
#[derive(Debug, Default)]
pub struct InMemoryCollaborators {
    tables: RwLock<Tables>,
}

impl InMemoryCollaborators {
    /// Creates empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the exchange rate for a currency pair.
    pub async fn set_exchange_rate(&self, from: &str, to: &str, rate: Decimal) {
        self.tables
            .write()
            .await
            .exchange_rates
            .insert(pair(from, to), rate);
    }

    /// Stores the margin of a region pair.
    pub async fn set_country_margin(&self, primary: &str, affiliate: &str, margin: Decimal) {
        self.tables
            .write()
            .await
            .country_margins
            .insert(pair(primary, affiliate), margin);
    }

    /// Stores the cross-border fees of a shop.
    pub async fn set_platform_fees(&self, shop_id: u64, fees: PlatformFees) {
        self.tables.write().await.platform_fees.insert(shop_id, fees);
    }

    /// Stores the local fees of a shop.
    pub async fn set_local_fees(&self, shop_id: u64, fees: PlatformFees) {
        self.tables.write().await.local_fees.insert(shop_id, fees);
    }

    /// Appends a mapping record.
    pub async fn insert_record(&self, record: AffiliateItemRecord) {
        let mut tables = self.tables.write().await;
        tables.next_record_id = tables.next_record_id.max(record.id);
        tables
            .records
            .entry(record.affiliate_item_id)
            .or_default()
            .push(record);
    }

    /// Returns the promotion linked to an affiliate item.
    pub async fn promotion_id(&self, affiliate_item_id: u64) -> Option<u64> {
        self.tables
            .read()
            .await
            .promotions
            .get(&affiliate_item_id)
            .copied()
    }
}

fn pair(a: &str, b: &str) -> (String, String) {
    (a.to_ascii_uppercase(), b.to_ascii_uppercase())
}

#[async_trait]
impl FactorResolver for InMemoryCollaborators {
    async fn shop_margin(&self, shop_id: u64) -> EngineResult<Decimal> {
        self.tables
            .read()
            .await
            .shop_margins
            .get(&shop_id)
            .copied()
            .ok_or_else(|| EngineError::not_found("Shop margin", shop_id))
    }

    async fn exchange_rate(&self, from: &str, to: &str) -> EngineResult<Decimal> {
        self.tables
            .read()
            .await
            .exchange_rates
            .get(&pair(from, to))
            .copied()
            .ok_or_else(|| EngineError::not_found("Exchange rate", format!("{}->{}", from, to)))
    }

    async fn country_margin(
        &self,
        primary_region: &str,
        affiliate_region: &str,
    ) -> EngineResult<Decimal> {
        self.tables
            .read()
            .await
            .country_margins
            .get(&pair(primary_region, affiliate_region))
            .copied()
            .ok_or_else(|| {
                EngineError::not_found(
                    "Country margin",
                    format!("{}->{}", primary_region, affiliate_region),
                )
            })
    }

    async fn platform_fees(&self, shop_id: u64) -> EngineResult<PlatformFees> {
        self.tables
            .read()
            .await
            .platform_fees
            .get(&shop_id)
            .copied()
            .ok_or_else(|| EngineError::not_found("Platform fees", shop_id))
    }

    async fn local_fees(&self, shop_id: u64) -> EngineResult<PlatformFees> {
        self.tables
            .read()
            .await
            .local_fees
            .get(&shop_id)
            .copied()
            .ok_or_else(|| EngineError::not_found("Local fees", shop_id))
    }
}

#[async_trait]
impl AffiliateItemRepository for InMemoryCollaborators {
    async fn find_by_affiliate_item(
        &self,
        affiliate_item_id: u64,
    ) -> EngineResult<Vec<AffiliateItemRecord>> {
        Ok(self
            .tables
            .read()
            .await
            .records
            .get(&affiliate_item_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl PersistenceSink for InMemoryCollaborators {
    async fn upsert_shop_margin(&self, shop_id: u64, margin: Decimal) -> EngineResult<()> {
        self.tables.write().await.shop_margins.insert(shop_id, margin);
        Ok(())
    }

    async fn upsert_item_margin(
        &self,
        affiliate_item_id: u64,
        margin: Decimal,
    ) -> EngineResult<()> {
        let mut tables = self.tables.write().await;
        tables.latest_record_mut(affiliate_item_id).item_margin = margin;
        Ok(())
    }

    async fn upsert_item_real_weight(
        &self,
        affiliate_item_id: u64,
        weight_grams: i64,
    ) -> EngineResult<()> {
        let mut tables = self.tables.write().await;
        tables.latest_record_mut(affiliate_item_id).real_weight = Some(weight_grams);
        Ok(())
    }

    async fn upsert_promotion_id(
        &self,
        affiliate_item_id: u64,
        promotion_id: u64,
    ) -> EngineResult<()> {
        self.tables
            .write()
            .await
            .promotions
            .insert(affiliate_item_id, promotion_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_missing_factors_are_not_found() {
        let store = InMemoryCollaborators::new();

        assert!(matches!(
            store.shop_margin(1).await,
            Err(EngineError::NotFound { .. })
        ));
        assert!(matches!(
            store.exchange_rate("SGD", "MYR").await,
            Err(EngineError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_pairs_are_case_insensitive() {
        let store = InMemoryCollaborators::new();
        store.set_country_margin("sg", "my", dec("0.05")).await;

        assert_eq!(store.country_margin("SG", "MY").await.unwrap(), dec("0.05"));
    }

    #[tokio::test]
    async fn test_item_upserts_touch_latest_record() {
        let store = InMemoryCollaborators::new();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for id in [3, 9] {
            store
                .insert_record(AffiliateItemRecord {
                    id,
                    affiliate_item_id: 42,
                    primary_item_id: 7,
                    item_margin: Decimal::ZERO,
                    real_weight: None,
                    created_at: at,
                })
                .await;
        }

        store.upsert_item_margin(42, dec("0.03")).await.unwrap();
        store.upsert_item_real_weight(42, 800).await.unwrap();

        let records = store.find_by_affiliate_item(42).await.unwrap();
        let updated = records.iter().find(|r| r.id == 9).unwrap();
        assert_eq!(updated.item_margin, dec("0.03"));
        assert_eq!(updated.real_weight, Some(800));
        assert_eq!(records.iter().find(|r| r.id == 3).unwrap().real_weight, None);
    }

    #[tokio::test]
    async fn test_upsert_creates_record_when_missing() {
        let store = InMemoryCollaborators::new();

        store.upsert_item_real_weight(5, 250).await.unwrap();
        store.upsert_promotion_id(5, 77).await.unwrap();

        let records = store.find_by_affiliate_item(5).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].real_weight, Some(250));
        assert_eq!(store.promotion_id(5).await, Some(77));
    }
}
