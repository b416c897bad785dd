//! Core data models for the SIP price engine.
//!
//! This module contains the request, factor and result types exchanged
//! between the pricing service, the derivation engine and callers.

mod affiliate_item;
mod calculation_result;
mod query;

pub use affiliate_item::AffiliateItemRecord;
pub use calculation_result::{AuditStep, AuditTrace, CalculationResult, PlatformFees, PriceFactors};
pub use query::{CalculationMode, CalculationQuery};
