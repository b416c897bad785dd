//! Local (same-country) item price conversion.

use rust_decimal::Decimal;

use crate::config::PricingSettings;
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditTrace, CalculationQuery, CalculationResult, PriceFactors};
use crate::numeric::{round_to, to_fixed, to_real};

/// Precision of locally converted prices.
pub const LOCAL_PRICE_DECIMALS: u32 = 2;

/// Converts one local price (real units).
///
/// ```text
/// net = price * (1 - reference_service - transaction - commission)
/// net > 0:  item = (net - hidden) / exchange_rate
/// net <= 0: item = net / exchange_rate
/// ```
///
/// The result is rounded to two decimals and never below `min_price`. The
/// hidden price is only deducted when the fee-deducted price is positive.
///
/// # Examples
///
/// ```
/// use sip_price_engine::calculation::convert_local_price;
/// use sip_price_engine::models::{PlatformFees, PriceFactors};
/// use rust_decimal::Decimal;
///
/// let factors = PriceFactors {
///     weight: 0,
///     country_margin: Decimal::ZERO,
///     shop_margin: Decimal::ZERO,
///     item_margin: Decimal::ZERO,
///     exchange_rate: Decimal::ONE,
///     price_ratio: Decimal::ONE,
///     hidden_price: Decimal::new(1, 0),
///     currency: "THB".to_string(),
///     fees: PlatformFees {
///         service_fee: Decimal::new(1, 1),
///         commission_fee: Decimal::ZERO,
///         handling_fee: Decimal::ZERO,
///     },
/// };
/// let price = convert_local_price(Decimal::new(10, 0), &factors, Decimal::new(1, 2)).unwrap();
/// assert_eq!(price, Decimal::new(8, 0));
/// ```
pub fn convert_local_price(
    price: Decimal,
    factors: &PriceFactors,
    min_price: Decimal,
) -> EngineResult<Decimal> {
    if factors.exchange_rate <= Decimal::ZERO {
        return Err(EngineError::invariant(format!(
            "exchange rate {} is not positive",
            factors.exchange_rate
        )));
    }

    let overflow = || EngineError::invariant("local price conversion overflow");
    let net = price
        .checked_mul(Decimal::ONE - factors.fees.total())
        .ok_or_else(overflow)?;

    let net = if net > Decimal::ZERO {
        net.checked_sub(factors.hidden_price).ok_or_else(overflow)?
    } else {
        net
    };

    let converted = net
        .checked_div(factors.exchange_rate)
        .ok_or_else(overflow)?;

    Ok(round_to(converted, LOCAL_PRICE_DECIMALS).max(min_price))
}

/// Computes local item prices for a same-country mapping.
///
/// Margins and the price ratio do not take part in local conversion; the
/// settlement price is the primary price itself. The factor snapshot is
/// returned unchanged.
pub fn compute_local_item_price(
    query: &CalculationQuery,
    factors: &PriceFactors,
    pricing: &PricingSettings,
) -> EngineResult<CalculationResult> {
    if query.primary_item_price <= 0 {
        return Err(EngineError::invalid(
            "primary_item_price",
            format!("must be positive, got {}", query.primary_item_price),
        ));
    }

    let mut trace = AuditTrace::default();
    let min_price = pricing.local_min_price;

    let price = to_real(query.primary_item_price);
    let normal_real = convert_local_price(price, factors, min_price)?;
    let normal_price = to_fixed(normal_real)?;
    trace.record(
        "local_normal_price",
        "Local Normal Price",
        local_input(price, factors),
        serde_json::json!({ "price": normal_price }),
        format!(
            "{} less fees {} and hidden price {} at rate {} = {}",
            price.normalize(),
            factors.fees.total().normalize(),
            factors.hidden_price.normalize(),
            factors.exchange_rate.normalize(),
            normal_real.normalize()
        ),
    );

    let promotion_price = match query.active_promotion_price() {
        Some(promotion) => {
            let promotion = to_real(promotion);
            let promo_real = convert_local_price(promotion, factors, min_price)?;
            let promo_price = to_fixed(promo_real)?;
            trace.record(
                "local_promotion_price",
                "Local Promotion Price",
                local_input(promotion, factors),
                serde_json::json!({ "price": promo_price }),
                format!("{} converted to {}", promotion.normalize(), promo_real.normalize()),
            );
            Some(promo_price)
        }
        None => None,
    };

    Ok(CalculationResult {
        normal_price,
        promotion_price,
        settlement_price: query.primary_item_price,
        settlement_currency: query.primary_currency.clone(),
        factors: factors.clone(),
        audit_trace: trace,
    })
}

fn local_input(price: Decimal, factors: &PriceFactors) -> serde_json::Value {
    serde_json::json!({
        "price": price.normalize().to_string(),
        "reference_service_fee": factors.fees.service_fee.to_string(),
        "transaction_fee": factors.fees.handling_fee.to_string(),
        "commission_fee": factors.fees.commission_fee.to_string(),
        "hidden_price": factors.hidden_price.to_string(),
        "exchange_rate": factors.exchange_rate.to_string()
    })
}
