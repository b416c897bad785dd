//! Typed configuration-info queries.
//!
//! Each supported info type is one variant carrying its own parameters,
//! answered with the matching [`ConfigInfo`] variant.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::ConfigStores;
use super::hidden_fee::{RuleBrief, RuleDetail};
use super::region::RegionRate;

/// A configuration info request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "info_type", rename_all = "snake_case")]
pub enum ConfigInfoQuery {
    /// Full schedule of one hidden-fee rule.
    HiddenFeeRule {
        /// The rule key.
        rule_key: String,
    },
    /// One page of hidden-fee rule summaries.
    HiddenFeeRules {
        /// Zero-based page index.
        page_index: usize,
        /// Page size.
        page_size: usize,
    },
    /// Every hidden-fee rule with its schedule.
    AllHiddenFeeRules,
    /// Rate of one region pair.
    RegionRate {
        /// Source region.
        source: String,
        /// Destination region.
        destination: String,
    },
    /// Allow-list membership of one identifier.
    AllowListed {
        /// The identifier.
        id: String,
    },
}

/// The answer to a [`ConfigInfoQuery`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "info_type", content = "data", rename_all = "snake_case")]
pub enum ConfigInfo {
    /// See [`ConfigInfoQuery::HiddenFeeRule`].
    HiddenFeeRule(RuleDetail),
    /// See [`ConfigInfoQuery::HiddenFeeRules`].
    HiddenFeeRules {
        /// The page.
        rules: Vec<RuleBrief>,
        /// Total number of rules.
        total: usize,
    },
    /// See [`ConfigInfoQuery::AllHiddenFeeRules`].
    AllHiddenFeeRules(Vec<RuleDetail>),
    /// See [`ConfigInfoQuery::RegionRate`].
    RegionRate(RegionRate),
    /// See [`ConfigInfoQuery::AllowListed`].
    AllowListed(bool),
}

impl ConfigStores {
    /// Answers a typed configuration info query from the current snapshots.
    pub fn query_info(&self, query: &ConfigInfoQuery) -> EngineResult<ConfigInfo> {
        match query {
            ConfigInfoQuery::HiddenFeeRule { rule_key } => self
                .hidden_fee
                .rule_detail(rule_key)?
                .map(ConfigInfo::HiddenFeeRule)
                .ok_or_else(|| EngineError::not_found("Hidden fee rule", rule_key)),
            ConfigInfoQuery::HiddenFeeRules {
                page_index,
                page_size,
            } => {
                let (rules, total) = self.hidden_fee.list_rules(*page_index, *page_size)?;
                Ok(ConfigInfo::HiddenFeeRules { rules, total })
            }
            ConfigInfoQuery::AllHiddenFeeRules => {
                Ok(ConfigInfo::AllHiddenFeeRules(self.hidden_fee.all_rules()?))
            }
            ConfigInfoQuery::RegionRate {
                source,
                destination,
            } => self
                .region
                .rate(source, destination)?
                .map(ConfigInfo::RegionRate)
                .ok_or_else(|| {
                    EngineError::not_found("Region rate", format!("{}->{}", source, destination))
                }),
            ConfigInfoQuery::AllowListed { id } => {
                Ok(ConfigInfo::AllowListed(self.allow_list.exists(id)))
            }
        }
    }
}
