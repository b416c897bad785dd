//! Shared numeric utilities.
//!
//! Prices and fees travel through the system as fixed-point `i64` values
//! with five decimal digits. This module converts between that
//! representation and [`rust_decimal::Decimal`], and holds the rounding
//! rules used by the price derivation engine.

mod fixed_point;
mod rounding;

pub use fixed_point::{PRICE_DECIMALS, PRICE_SCALE, scale_percentage, to_fixed, to_real};
pub use rounding::{currency_decimals, round_nearest, round_to};
