//! Configuration loading and management for the SIP price engine.
//!
//! This module loads engine settings (cache refresh cadence, paging,
//! currency precision overrides and request timeouts) from a YAML file.
//!
//! # Example
//!
//! ```no_run
//! use sip_price_engine::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load("./config/engine.yaml").unwrap();
//! println!("refresh every {:?}", loader.settings().cache.refresh_interval());
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{CacheSettings, EngineSettings, PricingSettings};
