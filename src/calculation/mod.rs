//! Price derivation for the SIP price engine.
//!
//! This module contains the pure pricing functions: cross-border affiliate
//! price derivation, local item price conversion, the shared conversion
//! formula, promotion ratio capping, shipping weight resolution and the
//! duplicate-record tie-break.

mod affiliate_price;
mod dirty_data;
mod local_price;
mod price_conversion;
mod promotion;
mod weight;

pub use affiliate_price::compute_affiliate_price;
pub use dirty_data::select_latest_record;
pub use local_price::{LOCAL_PRICE_DECIMALS, compute_local_item_price, convert_local_price};
pub use price_conversion::{convert_price, final_fee};
pub use promotion::{VN_PROMOTION_RATIO_CAP, promotion_ratio, promotion_ratio_cap};
pub use weight::resolve_real_weight;
