//! Calculation query model.

use serde::{Deserialize, Serialize};

/// Distinguishes a price sync for an existing mapping from a first-time creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMode {
    /// Price sync for an existing primary/affiliate mapping.
    #[default]
    PriceSync,
    /// Price computation while the affiliate item is being created.
    ///
    /// A missing affiliate item record is tolerated in this mode.
    ForCreate,
}

/// One request to compute an affiliate price.
///
/// Prices and weights are fixed-point (`100000` is one currency unit) and
/// grams respectively.
///
/// # Example
///
/// ```
/// use sip_price_engine::models::{CalculationMode, CalculationQuery};
///
/// let query: CalculationQuery = serde_json::from_str(r#"{
///     "primary_item_id": 1,
///     "primary_item_price": 100000,
///     "primary_item_weight": 500,
///     "primary_shop_id": 10,
///     "primary_region": "SG",
///     "primary_currency": "SGD",
///     "affiliate_shop_id": 20,
///     "affiliate_region": "MY",
///     "affiliate_currency": "MYR"
/// }"#).unwrap();
/// assert_eq!(query.mode, CalculationMode::PriceSync);
/// assert!(query.promotion_price.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationQuery {
    /// The primary item identifier.
    pub primary_item_id: u64,
    /// The primary item's normal price (fixed-point).
    pub primary_item_price: i64,
    /// The primary item's declared weight in grams.
    #[serde(default)]
    pub primary_item_weight: i64,
    /// The primary shop identifier.
    pub primary_shop_id: u64,
    /// The primary marketplace region (e.g. "SG").
    pub primary_region: String,
    /// The primary marketplace currency; also the settlement currency.
    pub primary_currency: String,
    /// The affiliate item identifier, absent before creation.
    #[serde(default)]
    pub affiliate_item_id: Option<u64>,
    /// The affiliate shop identifier.
    pub affiliate_shop_id: u64,
    /// The affiliate marketplace region (e.g. "VN").
    pub affiliate_region: String,
    /// The affiliate marketplace currency.
    pub affiliate_currency: String,
    /// The primary item's promotion price (fixed-point), if on promotion.
    #[serde(default)]
    pub promotion_price: Option<i64>,
    /// Sync or create flow.
    #[serde(default)]
    pub mode: CalculationMode,
}

impl CalculationQuery {
    /// Returns true for cross-border mappings.
    pub fn is_cross_border(&self) -> bool {
        !self
            .primary_region
            .eq_ignore_ascii_case(&self.affiliate_region)
    }

    /// Returns the promotion price when it is present and positive.
    pub fn active_promotion_price(&self) -> Option<i64> {
        self.promotion_price.filter(|price| *price > 0)
    }
}
