//! Rounding rules.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to the nearest integer, halves away from zero.
pub fn round_nearest(value: Decimal) -> Decimal {
    round_to(value, 0)
}

/// Rounds to `decimals` places, halves away from zero.
pub fn round_to(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the display precision of a currency.
///
/// Currencies without a minor unit in practice are priced in whole units;
/// everything else carries two decimals. Configuration may override this
/// table, see [`crate::config::PricingSettings`].
pub fn currency_decimals(currency: &str) -> u32 {
    match currency.to_ascii_uppercase().as_str() {
        "VND" | "IDR" | "TWD" | "KRW" | "JPY" | "CLP" | "COP" => 0,
        _ => 2,
    }
}
