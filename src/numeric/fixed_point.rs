//! Fixed-point conversion.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{EngineError, EngineResult};

use super::rounding::round_nearest;

/// Number of decimal digits carried by fixed-point prices.
pub const PRICE_DECIMALS: u32 = 5;

/// Multiplier between a real price and its fixed-point representation.
pub const PRICE_SCALE: i64 = 100_000;

/// Converts a fixed-point value into a real decimal.
///
/// # Examples
///
/// ```
/// use sip_price_engine::numeric::to_real;
/// use rust_decimal::Decimal;
///
/// assert_eq!(to_real(150_000), Decimal::new(15, 1));
/// ```
pub fn to_real(value: i64) -> Decimal {
    Decimal::new(value, PRICE_DECIMALS)
}

/// Converts a real decimal into fixed-point, rounding to the nearest unit.
///
/// Fails with an invariant violation when the value does not fit in `i64`.
///
/// # Examples
///
/// ```
/// use sip_price_engine::numeric::to_fixed;
/// use rust_decimal::Decimal;
///
/// assert_eq!(to_fixed(Decimal::new(123_456_789, 8)).unwrap(), 123_457);
/// ```
pub fn to_fixed(value: Decimal) -> EngineResult<i64> {
    let scaled = value
        .checked_mul(Decimal::from(PRICE_SCALE))
        .ok_or_else(|| EngineError::invariant(format!("fixed-point overflow for {}", value)))?;

    round_nearest(scaled)
        .to_i64()
        .ok_or_else(|| EngineError::invariant(format!("fixed-point overflow for {}", value)))
}

/// Scales a fee or margin stored fixed-point (e.g. `2000` for 2%) into a fraction.
pub fn scale_percentage(value: i64) -> Decimal {
    to_real(value)
}
