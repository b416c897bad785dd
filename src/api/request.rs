//! Query-string parameters for the SIP price engine API.
//!
//! Calculation endpoints take a [`crate::models::CalculationQuery`] body
//! directly; the lookup endpoints take the parameters below.

use serde::{Deserialize, Serialize};

/// Default page size of the rule listing.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Parameters of `GET /hidden-fee/:rule_key/tier`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierParams {
    /// Shipping weight in grams.
    pub weight: i64,
}

/// Parameters of `GET /hidden-fee/rules`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulePageParams {
    /// Zero-based page index.
    #[serde(default)]
    pub page_index: usize,
    /// Page size.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_defaults() {
        let params: RulePageParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.page_index, 0);
        assert_eq!(params.page_size, DEFAULT_PAGE_SIZE);
    }
}
