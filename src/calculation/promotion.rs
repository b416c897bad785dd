//! Promotion ratio derivation.

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};

/// Upper bound on the promotion ratio for the VN affiliate region.
pub const VN_PROMOTION_RATIO_CAP: Decimal = Decimal::TWO;

/// Returns the promotion ratio cap of an affiliate region, if it has one.
pub fn promotion_ratio_cap(affiliate_region: &str) -> Option<Decimal> {
    match affiliate_region.to_ascii_uppercase().as_str() {
        "VN" => Some(VN_PROMOTION_RATIO_CAP),
        _ => None,
    }
}

/// Returns `normal / promotion`, capped for regions that have a cap.
///
/// Both prices are real (not fixed-point) and must be positive.
///
/// # Examples
///
/// ```
/// use sip_price_engine::calculation::promotion_ratio;
/// use rust_decimal::Decimal;
///
/// let ratio = promotion_ratio(Decimal::new(10, 0), Decimal::new(4, 0), "MY").unwrap();
/// assert_eq!(ratio, Decimal::new(25, 1));
///
/// let capped = promotion_ratio(Decimal::new(10, 0), Decimal::new(4, 0), "VN").unwrap();
/// assert_eq!(capped, Decimal::new(2, 0));
/// ```
pub fn promotion_ratio(
    normal_price: Decimal,
    promotion_price: Decimal,
    affiliate_region: &str,
) -> EngineResult<Decimal> {
    if promotion_price <= Decimal::ZERO {
        return Err(EngineError::invalid("promotion_price", "must be positive"));
    }

    let ratio = normal_price
        .checked_div(promotion_price)
        .ok_or_else(|| EngineError::invariant("promotion ratio overflow"))?;

    Ok(match promotion_ratio_cap(affiliate_region) {
        Some(cap) if ratio > cap => cap,
        _ => ratio,
    })
}
