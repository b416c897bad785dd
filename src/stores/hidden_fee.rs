//! Hidden-fee rule store.
//!
//! Hidden logistics fees are weight-tiered schedules keyed by a synthetic
//! rule key built from the primary and affiliate regions. Besides tier
//! lookup the store exposes detail, paginated and full listing views, all
//! computed from one published snapshot.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cache::{RateTier, Refreshable, RowSource, RuleSet, TieredRateCache};
use crate::error::EngineResult;

/// Row-source domain of the hidden-fee schedules.
pub const HIDDEN_FEE_DOMAIN: &str = "hidden_fee";

/// Summary of one rule for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleBrief {
    /// The rule key.
    pub rule_key: String,
    /// The first non-empty tier description of the rule.
    pub description: String,
    /// Number of tiers in the schedule.
    pub tier_count: usize,
}

/// Full schedule of one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDetail {
    /// The rule key.
    pub rule_key: String,
    /// Tiers in ascending weight order.
    pub tiers: Vec<RateTier>,
}

/// Tiered cache of hidden-fee schedules.
pub struct HiddenFeeStore {
    cache: TieredRateCache,
}

impl HiddenFeeStore {
    /// Creates an empty store reading from `source`.
    pub fn new(source: Arc<dyn RowSource>, batch_size: usize) -> Self {
        Self {
            cache: TieredRateCache::new(HIDDEN_FEE_DOMAIN, source, batch_size),
        }
    }

    /// Returns the rule key for a region pair (e.g. `SG_MY`).
    pub fn rule_key(primary_region: &str, affiliate_region: &str) -> String {
        format!(
            "{}_{}",
            primary_region.to_ascii_uppercase(),
            affiliate_region.to_ascii_uppercase()
        )
    }

    /// Returns the fallback rule key for an affiliate region (e.g. `DEFAULT_MY`).
    pub fn default_rule_key(affiliate_region: &str) -> String {
        format!("DEFAULT_{}", affiliate_region.to_ascii_uppercase())
    }

    /// Returns true once the first snapshot has been published.
    pub fn is_ready(&self) -> bool {
        self.cache.is_ready()
    }

    /// Looks up the tier of `rule_key` covering `weight`.
    pub fn lookup_tier(&self, rule_key: &str, weight: i64) -> EngineResult<Option<RateTier>> {
        self.cache.lookup(rule_key, weight)
    }

    /// Resolves the tier for a region pair.
    ///
    /// The default rule of the affiliate region is used only when the pair
    /// has no schedule at all; a pair schedule that does not cover `weight`
    /// is a miss.
    pub fn resolve_tier(
        &self,
        primary_region: &str,
        affiliate_region: &str,
        weight: i64,
    ) -> EngineResult<Option<(String, RateTier)>> {
        let rules = self.cache.snapshot()?;

        let specific = Self::rule_key(primary_region, affiliate_region);
        let key = if rules.contains_key(&specific) {
            specific
        } else {
            Self::default_rule_key(affiliate_region)
        };

        Ok(rules
            .lookup(&key, weight)
            .cloned()
            .map(|tier| (key, tier)))
    }

    /// Returns the full schedule of `rule_key`.
    pub fn rule_detail(&self, rule_key: &str) -> EngineResult<Option<RuleDetail>> {
        let rules = self.cache.snapshot()?;
        Ok(rules.tiers(rule_key).map(|tiers| RuleDetail {
            rule_key: rule_key.to_string(),
            tiers: tiers.to_vec(),
        }))
    }

    /// Returns one page of rule summaries, ordered by key, plus the total rule count.
    ///
    /// `page_index` is zero-based. Bounds are clamped to the rule count, so
    /// an out-of-range page is empty rather than an error.
    pub fn list_rules(
        &self,
        page_index: usize,
        page_size: usize,
    ) -> EngineResult<(Vec<RuleBrief>, usize)> {
        let rules = self.cache.snapshot()?;
        let keys = rules.sorted_keys();
        let total = keys.len();

        let start = page_index.saturating_mul(page_size).min(total);
        let end = start.saturating_add(page_size).min(total);

        let page = keys[start..end]
            .iter()
            .map(|key| brief(&rules, key))
            .collect();

        Ok((page, total))
    }

    /// Returns every rule with its full schedule, ordered by key.
    pub fn all_rules(&self) -> EngineResult<Vec<RuleDetail>> {
        let rules = self.cache.snapshot()?;
        Ok(rules
            .sorted_keys()
            .into_iter()
            .map(|key| RuleDetail {
                rule_key: key.to_string(),
                tiers: rules.tiers(key).map(<[RateTier]>::to_vec).unwrap_or_default(),
            })
            .collect())
    }
}

fn brief(rules: &RuleSet, key: &str) -> RuleBrief {
    let tiers = rules.tiers(key).unwrap_or_default();
    RuleBrief {
        rule_key: key.to_string(),
        description: tiers
            .iter()
            .map(|t| t.description.as_str())
            .find(|d| !d.is_empty())
            .unwrap_or_default()
            .to_string(),
        tier_count: tiers.len(),
    }
}

#[async_trait]
impl Refreshable for HiddenFeeStore {
    fn domain(&self) -> &str {
        self.cache.domain()
    }

    async fn refresh(&self) -> EngineResult<usize> {
        self.cache.refresh().await
    }
}
