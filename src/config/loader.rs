//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! settings from a YAML file.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::EngineSettings;

/// Loads and validates engine settings.
///
/// # File Format
///
/// ```text
/// cache:
///   refresh_interval_secs: 30
///   retry_backoff_secs: 5
///   batch_size: 500
/// pricing:
///   local_min_price: "0.01"
///   currency_decimals:
///     VND: 0
/// request_timeout_ms: 3000
/// ```
///
/// # Example
///
/// ```
/// use sip_price_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::from_yaml_str("cache:\n  batch_size: 100\n", "inline").unwrap();
/// assert_eq!(loader.settings().cache.batch_size, 100);
/// assert_eq!(loader.settings().cache.refresh_interval_secs, 30);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    settings: EngineSettings,
}

impl ConfigLoader {
    /// Loads settings from the YAML file at `path`.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - The file is missing (`ConfigNotFound`)
    /// - The file contains invalid YAML or invalid values (`ConfigParseError`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        Self::from_yaml_str(&content, &path_str)
    }

    /// Parses settings from YAML text; `origin` names the source in errors.
    pub fn from_yaml_str(content: &str, origin: &str) -> EngineResult<Self> {
        let mut settings: EngineSettings = if content.trim().is_empty() {
            EngineSettings::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| EngineError::ConfigParseError {
                path: origin.to_string(),
                message: e.to_string(),
            })?
        };

        Self::normalize_currency_keys(&mut settings, origin)?;
        Self::validate(&settings, origin)?;
        Ok(Self { settings })
    }

    /// Upper-cases currency override keys; two keys that fold together are rejected.
    fn normalize_currency_keys(settings: &mut EngineSettings, origin: &str) -> EngineResult<()> {
        let overrides = std::mem::take(&mut settings.pricing.currency_decimals);
        for (currency, decimals) in overrides {
            let key = currency.trim().to_ascii_uppercase();
            if settings
                .pricing
                .currency_decimals
                .insert(key.clone(), decimals)
                .is_some()
            {
                return Err(EngineError::ConfigParseError {
                    path: origin.to_string(),
                    message: format!("pricing.currency_decimals repeats currency {}", key),
                });
            }
        }
        Ok(())
    }

    fn validate(settings: &EngineSettings, origin: &str) -> EngineResult<()> {
        let invalid = |message: &str| EngineError::ConfigParseError {
            path: origin.to_string(),
            message: message.to_string(),
        };

        if settings.cache.refresh_interval_secs == 0 {
            return Err(invalid("cache.refresh_interval_secs must be positive"));
        }
        if settings.cache.retry_backoff_secs == 0 {
            return Err(invalid("cache.retry_backoff_secs must be positive"));
        }
        if settings.cache.batch_size == 0 {
            return Err(invalid("cache.batch_size must be positive"));
        }
        if settings.pricing.local_min_price <= rust_decimal::Decimal::ZERO {
            return Err(invalid("pricing.local_min_price must be positive"));
        }
        if settings.request_timeout_ms == 0 {
            return Err(invalid("request_timeout_ms must be positive"));
        }

        Ok(())
    }

    /// Returns the loaded settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Consumes the loader, returning the settings.
    pub fn into_settings(self) -> EngineSettings {
        self.settings
    }
}
