//! The shared cross-border price conversion formula.

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{PlatformFees, PriceFactors};
use crate::numeric::round_to;

/// Returns `1 + service + commission + handling`, rejecting a non-positive sum.
///
/// # Examples
///
/// ```
/// use sip_price_engine::calculation::final_fee;
/// use sip_price_engine::models::PlatformFees;
/// use rust_decimal::Decimal;
///
/// let fees = PlatformFees {
///     service_fee: Decimal::new(2, 2),
///     commission_fee: Decimal::new(3, 2),
///     handling_fee: Decimal::new(1, 2),
/// };
/// assert_eq!(final_fee(&fees).unwrap(), Decimal::new(106, 2));
/// ```
pub fn final_fee(fees: &PlatformFees) -> EngineResult<Decimal> {
    let fee = Decimal::ONE + fees.total();
    if fee <= Decimal::ZERO {
        return Err(EngineError::invariant(format!(
            "final fee {} is not positive (service {}, commission {}, handling {})",
            fee, fees.service_fee, fees.commission_fee, fees.handling_fee
        )));
    }
    Ok(fee)
}

/// Converts a primary price (real units) into an affiliate price.
///
/// ```text
/// ((price / ratio) * price_ratio * (1 + country + shop + item) + hidden)
///     * exchange_rate / final_fee
/// ```
///
/// rounded to `decimals` places. `ratio` is 1 for the normal price and the
/// promotion ratio for the promotion price.
pub fn convert_price(
    primary_price: Decimal,
    ratio: Decimal,
    factors: &PriceFactors,
    final_fee: Decimal,
    decimals: u32,
) -> EngineResult<Decimal> {
    if ratio <= Decimal::ZERO {
        return Err(EngineError::invariant(format!("price ratio divisor {} is not positive", ratio)));
    }
    if final_fee <= Decimal::ZERO {
        return Err(EngineError::invariant(format!("final fee {} is not positive", final_fee)));
    }

    let overflow = || EngineError::invariant("price conversion overflow");
    let margin =
        Decimal::ONE + factors.country_margin + factors.shop_margin + factors.item_margin;

    let converted = primary_price
        .checked_div(ratio)
        .and_then(|p| p.checked_mul(factors.price_ratio))
        .and_then(|p| p.checked_mul(margin))
        .and_then(|p| p.checked_add(factors.hidden_price))
        .and_then(|p| p.checked_mul(factors.exchange_rate))
        .and_then(|p| p.checked_div(final_fee))
        .ok_or_else(overflow)?;

    Ok(round_to(converted, decimals))
}
