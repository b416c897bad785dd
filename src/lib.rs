//! SIP Price Engine
//!
//! This crate derives affiliate marketplace prices from primary marketplace
//! prices. It serves weight-tiered hidden-fee schedules, the region rate
//! table and the hidden-fee exemption list from periodically refreshed
//! in-memory snapshots, and composes them with collaborator-supplied
//! margins, exchange rates and platform fees into auditable prices.

#![warn(missing_docs)]

pub mod api;
pub mod cache;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod numeric;
pub mod resolver;
pub mod stores;
