//! Cross-border affiliate price derivation.
//!
//! This module derives the affiliate normal price, the affiliate promotion
//! price and the settlement price from a primary price and a resolved set
//! of [`PriceFactors`]. Every step is recorded in the result's audit trace.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::config::PricingSettings;
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditTrace, CalculationQuery, CalculationResult, PriceFactors};
use crate::numeric::{round_nearest, to_fixed, to_real};

use super::price_conversion::{convert_price, final_fee};
use super::promotion::{promotion_ratio, promotion_ratio_cap};

/// Computes the affiliate prices for one query.
///
/// The steps, in order:
/// 1. the primary price must be positive (`InvalidParameter` otherwise)
/// 2. `final_fee = 1 + service + commission + handling` must be positive
/// 3. an active promotion yields `normal / promotion`, capped for VN
/// 4. normal and promotion prices go through [`convert_price`] and are
///    rounded to the affiliate currency's precision
/// 5. the settlement price is `round_nearest(primary * price_ratio)` in the
///    primary currency and must not be negative
///
/// The function is pure: identical inputs give identical results.
///
/// # Examples
///
/// ```
/// use sip_price_engine::calculation::compute_affiliate_price;
/// use sip_price_engine::config::PricingSettings;
/// use sip_price_engine::models::{CalculationMode, CalculationQuery, PlatformFees, PriceFactors};
/// use rust_decimal::Decimal;
///
/// let query = CalculationQuery {
///     primary_item_id: 1,
///     primary_item_price: 100_000,
///     primary_item_weight: 500,
///     primary_shop_id: 10,
///     primary_region: "SG".to_string(),
///     primary_currency: "SGD".to_string(),
///     affiliate_item_id: Some(2),
///     affiliate_shop_id: 20,
///     affiliate_region: "MY".to_string(),
///     affiliate_currency: "MYR".to_string(),
///     promotion_price: None,
///     mode: CalculationMode::PriceSync,
/// };
/// let factors = PriceFactors {
///     weight: 500,
///     country_margin: Decimal::ZERO,
///     shop_margin: Decimal::ZERO,
///     item_margin: Decimal::ZERO,
///     exchange_rate: Decimal::new(3, 0),
///     price_ratio: Decimal::ONE,
///     hidden_price: Decimal::ZERO,
///     currency: "MYR".to_string(),
///     fees: PlatformFees::default(),
/// };
///
/// let result = compute_affiliate_price(&query, &factors, &PricingSettings::default()).unwrap();
/// assert_eq!(result.normal_price, 300_000);
/// assert_eq!(result.settlement_price, 100_000);
/// ```
pub fn compute_affiliate_price(
    query: &CalculationQuery,
    factors: &PriceFactors,
    pricing: &PricingSettings,
) -> EngineResult<CalculationResult> {
    let mut trace = AuditTrace::default();

    if query.primary_item_price <= 0 {
        return Err(EngineError::invalid(
            "primary_item_price",
            format!("must be positive, got {}", query.primary_item_price),
        ));
    }
    if factors.exchange_rate <= Decimal::ZERO {
        return Err(EngineError::invariant(format!(
            "exchange rate {} is not positive",
            factors.exchange_rate
        )));
    }

    let primary_price = to_real(query.primary_item_price);
    let fee = final_fee(&factors.fees)?;
    trace.record(
        "final_fee",
        "Platform Fee Sum",
        serde_json::json!({
            "service_fee": factors.fees.service_fee.to_string(),
            "commission_fee": factors.fees.commission_fee.to_string(),
            "handling_fee": factors.fees.handling_fee.to_string()
        }),
        serde_json::json!({ "final_fee": fee.to_string() }),
        format!("1 + {} = {}", factors.fees.total().normalize(), fee.normalize()),
    );

    let decimals = pricing.decimals_for(&factors.currency);

    let normal_real = convert_price(primary_price, Decimal::ONE, factors, fee, decimals)?;
    let normal_price = to_fixed(normal_real)?;
    trace.record(
        "normal_price",
        "Affiliate Normal Price",
        serde_json::json!({
            "primary_price": primary_price.normalize().to_string(),
            "ratio": "1",
            "decimals": decimals
        }),
        serde_json::json!({ "price": normal_price }),
        format!(
            "{} {} converted to {} {}",
            primary_price.normalize(),
            query.primary_currency,
            normal_real.normalize(),
            factors.currency
        ),
    );

    let promotion_price = match query.active_promotion_price() {
        Some(promotion) => {
            let promotion_real = to_real(promotion);
            let ratio = promotion_ratio(primary_price, promotion_real, &query.affiliate_region)?;
            let cap = promotion_ratio_cap(&query.affiliate_region);
            let capped = match (cap, primary_price.checked_div(promotion_real)) {
                (Some(cap), Some(raw)) => raw > cap,
                _ => false,
            };
            trace.record(
                "promotion_ratio",
                "Promotion Ratio",
                serde_json::json!({
                    "normal_price": primary_price.normalize().to_string(),
                    "promotion_price": promotion_real.normalize().to_string(),
                    "affiliate_region": query.affiliate_region
                }),
                serde_json::json!({
                    "ratio": ratio.normalize().to_string(),
                    "cap": cap.map(|c| c.to_string()),
                    "capped": capped
                }),
                if capped {
                    format!("Ratio capped at {} for region {}", ratio, query.affiliate_region)
                } else {
                    format!("{} / {}", primary_price.normalize(), promotion_real.normalize())
                },
            );

            let promo_real = convert_price(primary_price, ratio, factors, fee, decimals)?;
            let promo_price = to_fixed(promo_real)?;
            trace.record(
                "promotion_price",
                "Affiliate Promotion Price",
                serde_json::json!({
                    "primary_price": primary_price.normalize().to_string(),
                    "ratio": ratio.normalize().to_string(),
                    "decimals": decimals
                }),
                serde_json::json!({ "price": promo_price }),
                format!(
                    "{} / {} converted to {} {}",
                    primary_price.normalize(),
                    ratio.normalize(),
                    promo_real.normalize(),
                    factors.currency
                ),
            );
            Some(promo_price)
        }
        None => None,
    };

    let settlement_price = settlement_price(query.primary_item_price, factors.price_ratio)?;
    trace.record(
        "settlement_price",
        "Settlement Price",
        serde_json::json!({
            "primary_price": query.primary_item_price,
            "price_ratio": factors.price_ratio.to_string()
        }),
        serde_json::json!({
            "price": settlement_price,
            "currency": query.primary_currency
        }),
        format!(
            "round({} x {}) = {}",
            query.primary_item_price,
            factors.price_ratio.normalize(),
            settlement_price
        ),
    );

    Ok(CalculationResult {
        normal_price,
        promotion_price,
        settlement_price,
        settlement_currency: query.primary_currency.clone(),
        factors: factors.clone(),
        audit_trace: trace,
    })
}

/// `round_nearest(primary_price * price_ratio)` on fixed-point units.
fn settlement_price(primary_price: i64, price_ratio: Decimal) -> EngineResult<i64> {
    let settlement = Decimal::from(primary_price)
        .checked_mul(price_ratio)
        .map(round_nearest)
        .and_then(|s| s.to_i64())
        .ok_or_else(|| EngineError::invariant("settlement price overflow"))?;

    if settlement < 0 {
        return Err(EngineError::invariant(format!(
            "settlement price {} is negative (price ratio {})",
            settlement, price_ratio
        )));
    }
    Ok(settlement)
}
