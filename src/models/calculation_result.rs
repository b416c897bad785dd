//! Calculation result models for the SIP price engine.
//!
//! This module contains the [`CalculationResult`] type together with the
//! [`PriceFactors`] audit snapshot and the step-by-step [`AuditTrace`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Platform fees charged on the affiliate side, as fractions.
///
/// For local conversion the service fee carries the reference service fee
/// and the handling fee carries the transaction fee.
///
/// # Example
///
/// ```
/// use sip_price_engine::models::PlatformFees;
/// use rust_decimal::Decimal;
///
/// let fees = PlatformFees {
///     service_fee: Decimal::new(2, 2),
///     commission_fee: Decimal::new(3, 2),
///     handling_fee: Decimal::new(1, 2),
/// };
/// assert_eq!(fees.total(), Decimal::new(6, 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlatformFees {
    /// Service fee rate.
    pub service_fee: Decimal,
    /// Commission fee rate.
    pub commission_fee: Decimal,
    /// Handling (transaction) fee rate.
    pub handling_fee: Decimal,
}

impl PlatformFees {
    /// Returns the sum of all fee rates.
    pub fn total(&self) -> Decimal {
        self.service_fee + self.commission_fee + self.handling_fee
    }
}

/// Immutable record of every input that contributed to a computed price.
///
/// Two computations with identical factors and query yield identical prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFactors {
    /// Shipping weight in grams used for the hidden-fee lookup.
    pub weight: i64,
    /// Margin configured for the region pair.
    pub country_margin: Decimal,
    /// Margin configured for the affiliate shop.
    pub shop_margin: Decimal,
    /// Margin configured for the affiliate item.
    pub item_margin: Decimal,
    /// Primary to affiliate currency exchange rate.
    pub exchange_rate: Decimal,
    /// Configured primary to affiliate pricing multiplier.
    pub price_ratio: Decimal,
    /// Hidden logistics fee in the primary currency (real units).
    pub hidden_price: Decimal,
    /// The affiliate currency.
    pub currency: String,
    /// Platform fees.
    pub fees: PlatformFees,
}

/// A single step in the audit trace recording a calculation decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// The ordered audit trace of a calculation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
}

impl AuditTrace {
    /// Appends a step, numbering it after the existing ones.
    pub fn record(
        &mut self,
        rule_id: &str,
        rule_name: &str,
        input: serde_json::Value,
        output: serde_json::Value,
        reasoning: String,
    ) {
        let step_number = self.steps.len() as u32 + 1;
        self.steps.push(AuditStep {
            step_number,
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            input,
            output,
            reasoning,
        });
    }

    /// Returns the step recorded for `rule_id`, if any.
    pub fn step(&self, rule_id: &str) -> Option<&AuditStep> {
        self.steps.iter().find(|s| s.rule_id == rule_id)
    }
}

/// The complete result of a price calculation.
///
/// Prices are fixed-point values with five decimal digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// The affiliate normal price.
    pub normal_price: i64,
    /// The affiliate promotion price; `None` when no promotion applies.
    pub promotion_price: Option<i64>,
    /// The settlement price in the primary currency.
    pub settlement_price: i64,
    /// The settlement currency (the primary currency).
    pub settlement_currency: String,
    /// Snapshot of all factors used.
    pub factors: PriceFactors,
    /// Step-by-step record of the derivation.
    pub audit_trace: AuditTrace,
}
