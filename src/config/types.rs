//! Configuration types for the SIP price engine.
//!
//! This module contains the strongly-typed settings structures that are
//! deserialized from the YAML configuration file. Every field has a default
//! so a partial file is valid.

use std::collections::HashMap;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::numeric::currency_decimals;

/// Refresh cadence and paging for the configuration caches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Seconds between two successful refreshes.
    pub refresh_interval_secs: u64,
    /// Seconds to wait before retrying a failed refresh.
    pub retry_backoff_secs: u64,
    /// Rows fetched per page from a row source.
    pub batch_size: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 30,
            retry_backoff_secs: 5,
            batch_size: 500,
        }
    }
}

impl CacheSettings {
    /// Returns the refresh interval as a [`Duration`].
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Returns the retry backoff as a [`Duration`].
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }
}

/// Pricing precision settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PricingSettings {
    /// Per-currency decimal overrides (e.g. `MYR: 2`).
    pub currency_decimals: HashMap<String, u32>,
    /// Floor applied to locally converted item prices.
    pub local_min_price: Decimal,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            currency_decimals: HashMap::new(),
            local_min_price: Decimal::new(1, 2),
        }
    }
}

impl PricingSettings {
    /// Returns the precision for `currency`, preferring configured overrides.
    pub fn decimals_for(&self, currency: &str) -> u32 {
        self.currency_decimals
            .get(&currency.to_ascii_uppercase())
            .copied()
            .unwrap_or_else(|| currency_decimals(currency))
    }
}

/// The complete engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Cache refresh settings.
    pub cache: CacheSettings,
    /// Pricing precision settings.
    pub pricing: PricingSettings,
    /// Upper bound on each collaborator call made while serving a request.
    pub request_timeout_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
            pricing: PricingSettings::default(),
            request_timeout_ms: 3_000,
        }
    }
}

impl EngineSettings {
    /// Returns the request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
