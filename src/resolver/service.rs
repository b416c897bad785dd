//! The pricing service: resolves factors and runs the price derivation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::time;
use tracing::{debug, info};

use crate::cache::RateTier;
use crate::calculation::{self, resolve_real_weight, select_latest_record};
use crate::config::EngineSettings;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AffiliateItemRecord, CalculationMode, CalculationQuery, CalculationResult, PriceFactors,
};
use crate::numeric::to_real;
use crate::stores::{ConfigInfo, ConfigInfoQuery, ConfigStores, HiddenFeeStore, RuleBrief};

use super::collaborators::{AffiliateItemRepository, FactorResolver, PersistenceSink};

/// The external collaborators used by [`PriceService`].
#[derive(Clone)]
pub struct Collaborators {
    /// Margin, exchange rate and fee lookups.
    pub factors: Arc<dyn FactorResolver>,
    /// Affiliate item mapping records.
    pub items: Arc<dyn AffiliateItemRepository>,
    /// Write-through sink for overrides.
    pub sink: Arc<dyn PersistenceSink>,
}

impl Collaborators {
    /// Uses one value for every collaborator role.
    pub fn from_shared<T>(shared: Arc<T>) -> Self
    where
        T: FactorResolver + AffiliateItemRepository + PersistenceSink + 'static,
    {
        Self {
            factors: shared.clone(),
            items: shared.clone(),
            sink: shared,
        }
    }
}

/// Factors read from the mapping record, or their defaults for a new item.
struct ItemOverrides {
    item_margin: Decimal,
    weight: i64,
}

/// Pricing operations over the configuration stores and collaborators.
///
/// Every collaborator call is bounded by the configured request timeout.
/// Dropping a pending operation drops its in-flight collaborator calls.
pub struct PriceService {
    settings: EngineSettings,
    stores: ConfigStores,
    collaborators: Collaborators,
}

impl PriceService {
    /// Creates a service. The stores are expected to be started separately.
    pub fn new(
        settings: EngineSettings,
        stores: ConfigStores,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            settings,
            stores,
            collaborators,
        }
    }

    /// Returns the configuration stores.
    pub fn stores(&self) -> &ConfigStores {
        &self.stores
    }

    /// Returns the engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Returns true once every configuration store has loaded.
    pub fn is_ready(&self) -> bool {
        self.stores.is_ready()
    }

    /// Computes cross-border affiliate prices for a query.
    ///
    /// Resolution order: mapping record, real weight, hidden fee, region
    /// price ratio, then the collaborator factors fetched concurrently.
    pub async fn compute_affiliate_price(
        &self,
        query: &CalculationQuery,
    ) -> EngineResult<CalculationResult> {
        validate_query(query)?;
        if !query.is_cross_border() {
            return Err(EngineError::invalid(
                "affiliate_region",
                format!(
                    "same region as primary ({}); use local price conversion",
                    query.primary_region
                ),
            ));
        }

        let overrides = self.item_overrides(query).await?;
        let hidden_price = self.hidden_price(query, overrides.weight)?;
        let price_ratio = self
            .stores
            .region
            .rate(&query.primary_region, &query.affiliate_region)?
            .ok_or_else(|| {
                EngineError::not_found(
                    "Region rate",
                    format!("{}->{}", query.primary_region, query.affiliate_region),
                )
            })?
            .price_ratio;

        let factors = &self.collaborators.factors;
        let (shop_margin, exchange_rate, country_margin, fees) = tokio::try_join!(
            self.call("shop_margin", factors.shop_margin(query.affiliate_shop_id)),
            self.call(
                "exchange_rate",
                factors.exchange_rate(&query.primary_currency, &query.affiliate_currency)
            ),
            self.call(
                "country_margin",
                factors.country_margin(&query.primary_region, &query.affiliate_region)
            ),
            self.call("platform_fees", factors.platform_fees(query.affiliate_shop_id)),
        )?;

        let factors = PriceFactors {
            weight: overrides.weight,
            country_margin,
            shop_margin,
            item_margin: overrides.item_margin,
            exchange_rate,
            price_ratio,
            hidden_price,
            currency: query.affiliate_currency.clone(),
            fees,
        };

        let result = calculation::compute_affiliate_price(query, &factors, &self.settings.pricing)?;
        info!(
            primary_item_id = query.primary_item_id,
            affiliate_region = %query.affiliate_region,
            normal_price = result.normal_price,
            promotion_price = ?result.promotion_price,
            settlement_price = result.settlement_price,
            "Affiliate price computed"
        );
        Ok(result)
    }

    /// Computes local (same-region) item prices for a query.
    pub async fn compute_local_item_price(
        &self,
        query: &CalculationQuery,
    ) -> EngineResult<CalculationResult> {
        validate_query(query)?;
        if query.is_cross_border() {
            return Err(EngineError::invalid(
                "affiliate_region",
                format!(
                    "{} differs from primary region {}; use affiliate price",
                    query.affiliate_region, query.primary_region
                ),
            ));
        }

        let overrides = self.item_overrides(query).await?;
        let hidden_price = self.hidden_price(query, overrides.weight)?;

        let factors = &self.collaborators.factors;
        let (exchange_rate, fees) = tokio::try_join!(
            self.call(
                "exchange_rate",
                factors.exchange_rate(&query.primary_currency, &query.affiliate_currency)
            ),
            self.call("local_fees", factors.local_fees(query.affiliate_shop_id)),
        )?;

        let factors = PriceFactors {
            weight: overrides.weight,
            country_margin: Decimal::ZERO,
            shop_margin: Decimal::ZERO,
            item_margin: Decimal::ZERO,
            exchange_rate,
            price_ratio: Decimal::ONE,
            hidden_price,
            currency: query.affiliate_currency.clone(),
            fees,
        };

        let result =
            calculation::compute_local_item_price(query, &factors, &self.settings.pricing)?;
        info!(
            primary_item_id = query.primary_item_id,
            region = %query.primary_region,
            normal_price = result.normal_price,
            promotion_price = ?result.promotion_price,
            "Local item price computed"
        );
        Ok(result)
    }

    /// Looks up the tier of `rule_key` covering `weight` grams.
    pub fn lookup_hidden_fee_tier(&self, rule_key: &str, weight: i64) -> EngineResult<RateTier> {
        if weight < 0 {
            return Err(EngineError::invalid("weight", "cannot be negative"));
        }
        self.stores
            .hidden_fee
            .lookup_tier(rule_key, weight)?
            .ok_or_else(|| {
                EngineError::not_found("Hidden fee tier", format!("{}@{}g", rule_key, weight))
            })
    }

    /// Returns one page of hidden-fee rules and the total rule count.
    pub fn list_hidden_fee_rules(
        &self,
        page_index: usize,
        page_size: usize,
    ) -> EngineResult<(Vec<RuleBrief>, usize)> {
        self.stores.hidden_fee.list_rules(page_index, page_size)
    }

    /// Returns true if `id` is exempt from the hidden fee.
    pub fn is_allow_listed(&self, id: &str) -> bool {
        self.stores.allow_list.exists(id)
    }

    /// Answers a typed configuration info query.
    pub fn config_info(&self, query: &ConfigInfoQuery) -> EngineResult<ConfigInfo> {
        self.stores.query_info(query)
    }

    /// Stores the margin of an affiliate shop.
    pub async fn set_shop_margin(&self, shop_id: u64, margin: Decimal) -> EngineResult<()> {
        validate_id("shop_id", shop_id)?;
        validate_margin(margin)?;
        self.call(
            "upsert_shop_margin",
            self.collaborators.sink.upsert_shop_margin(shop_id, margin),
        )
        .await?;
        info!(shop_id, margin = %margin, "Shop margin updated");
        Ok(())
    }

    /// Stores the margin of an affiliate item.
    pub async fn set_item_margin(
        &self,
        affiliate_item_id: u64,
        margin: Decimal,
    ) -> EngineResult<()> {
        validate_id("affiliate_item_id", affiliate_item_id)?;
        validate_margin(margin)?;
        self.call(
            "upsert_item_margin",
            self.collaborators
                .sink
                .upsert_item_margin(affiliate_item_id, margin),
        )
        .await?;
        info!(affiliate_item_id, margin = %margin, "Item margin updated");
        Ok(())
    }

    /// Stores the declared real weight of an affiliate item.
    pub async fn set_item_real_weight(
        &self,
        affiliate_item_id: u64,
        weight_grams: i64,
    ) -> EngineResult<()> {
        validate_id("affiliate_item_id", affiliate_item_id)?;
        if weight_grams <= 0 {
            return Err(EngineError::invalid(
                "weight",
                format!("must be positive, got {}", weight_grams),
            ));
        }
        self.call(
            "upsert_item_real_weight",
            self.collaborators
                .sink
                .upsert_item_real_weight(affiliate_item_id, weight_grams),
        )
        .await?;
        info!(affiliate_item_id, weight_grams, "Item real weight updated");
        Ok(())
    }

    /// Links an affiliate item to a promotion.
    pub async fn set_promotion_id(
        &self,
        affiliate_item_id: u64,
        promotion_id: u64,
    ) -> EngineResult<()> {
        validate_id("affiliate_item_id", affiliate_item_id)?;
        validate_id("promotion_id", promotion_id)?;
        self.call(
            "upsert_promotion_id",
            self.collaborators
                .sink
                .upsert_promotion_id(affiliate_item_id, promotion_id),
        )
        .await?;
        info!(affiliate_item_id, promotion_id, "Promotion linked");
        Ok(())
    }

    /// Reads the item margin and real weight from the newest mapping record.
    ///
    /// A create flow without a record prices with zero item margin and the
    /// primary weight; a sync flow requires the record.
    async fn item_overrides(&self, query: &CalculationQuery) -> EngineResult<ItemOverrides> {
        let record = match query.affiliate_item_id {
            Some(id) => self.latest_record(id).await?,
            None => None,
        };

        match (record, query.mode) {
            (Some(record), _) => Ok(ItemOverrides {
                item_margin: record.item_margin,
                weight: resolve_real_weight(record.real_weight, query.primary_item_weight),
            }),
            (None, CalculationMode::ForCreate) => Ok(ItemOverrides {
                item_margin: Decimal::ZERO,
                weight: resolve_real_weight(None, query.primary_item_weight),
            }),
            (None, CalculationMode::PriceSync) => match query.affiliate_item_id {
                Some(id) => Err(EngineError::not_found("Affiliate item", id)),
                None => Err(EngineError::invalid(
                    "affiliate_item_id",
                    "required for price sync",
                )),
            },
        }
    }

    async fn latest_record(
        &self,
        affiliate_item_id: u64,
    ) -> EngineResult<Option<AffiliateItemRecord>> {
        let records = self
            .call(
                "affiliate_item_repository",
                self.collaborators.items.find_by_affiliate_item(affiliate_item_id),
            )
            .await?;
        if records.len() > 1 {
            debug!(
                affiliate_item_id,
                duplicates = records.len(),
                "Multiple mapping records, using the newest"
            );
        }
        Ok(select_latest_record(&records).cloned())
    }

    /// Resolves the hidden logistics fee in real units.
    fn hidden_price(&self, query: &CalculationQuery, weight: i64) -> EngineResult<Decimal> {
        if self.is_allow_listed(&query.primary_shop_id.to_string()) {
            debug!(shop_id = query.primary_shop_id, "Shop exempt from hidden fee");
            return Ok(Decimal::ZERO);
        }

        let (rule_key, tier) = self
            .stores
            .hidden_fee
            .resolve_tier(&query.primary_region, &query.affiliate_region, weight)?
            .ok_or_else(|| {
                EngineError::not_found(
                    "Hidden fee tier",
                    format!(
                        "{}@{}g",
                        HiddenFeeStore::rule_key(&query.primary_region, &query.affiliate_region),
                        weight
                    ),
                )
            })?;

        let fee = tier.fee_for_weight(weight);
        debug!(rule_key = %rule_key, weight, fee, "Hidden fee resolved");
        Ok(to_real(fee))
    }

    /// Runs a collaborator call under the request timeout.
    async fn call<T, F>(&self, service: &str, future: F) -> EngineResult<T>
    where
        F: Future<Output = EngineResult<T>>,
    {
        with_timeout(self.settings.request_timeout(), service, future).await
    }
}

async fn with_timeout<T, F>(limit: Duration, service: &str, future: F) -> EngineResult<T>
where
    F: Future<Output = EngineResult<T>>,
{
    match time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(EngineError::ExternalService {
            service: service.to_string(),
            message: format!("timed out after {}ms", limit.as_millis()),
        }),
    }
}

fn validate_query(query: &CalculationQuery) -> EngineResult<()> {
    if query.primary_item_price <= 0 {
        return Err(EngineError::invalid(
            "primary_item_price",
            format!("must be positive, got {}", query.primary_item_price),
        ));
    }
    if query.primary_item_weight < 0 {
        return Err(EngineError::invalid(
            "primary_item_weight",
            format!("cannot be negative, got {}", query.primary_item_weight),
        ));
    }
    Ok(())
}

fn validate_id(field: &str, id: u64) -> EngineResult<()> {
    if id == 0 {
        return Err(EngineError::invalid(field, "must be non-zero"));
    }
    Ok(())
}

/// Margins are fractions in `[0, 1]`.
fn validate_margin(margin: Decimal) -> EngineResult<()> {
    if margin < Decimal::ZERO || margin > Decimal::ONE {
        return Err(EngineError::invalid(
            "margin",
            format!("must be between 0 and 1, got {}", margin),
        ));
    }
    Ok(())
}
