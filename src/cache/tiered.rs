//! Weight-tiered rule sets.
//!
//! A fee schedule is a list of [`RateTier`]s per rule key, ordered by
//! upper weight bound. Tiers partition the weight axis into half-open
//! intervals `(previous bound, bound]`; a weight above the last bound is
//! not covered by the schedule.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EngineError, EngineResult};

use super::refresher::Refreshable;
use super::snapshot::SnapshotCache;
use super::source::{RawConfigRow, RowSource, fetch_all};

/// One row of a weight-tiered fee schedule.
///
/// Prices are fixed-point with five decimal digits, weights are grams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTier {
    /// Inclusive upper weight bound of this tier.
    pub upper_weight_bound_grams: i64,
    /// Fee charged up to `start_weight`.
    pub start_price: i64,
    /// Weight covered by `start_price`.
    pub start_weight: i64,
    /// Weight is rounded up to a multiple of this before pricing.
    #[serde(default)]
    pub round_size: i64,
    /// Fee per additional `weight_step`.
    pub price: i64,
    /// Weight increment charged at `price`.
    pub weight_step: i64,
    /// Flat adjustment added to the fee.
    #[serde(default)]
    pub adjustment: i64,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

impl RateTier {
    /// Evaluates the tier for `weight` grams, returning a fixed-point fee.
    ///
    /// # Examples
    ///
    /// ```
    /// use sip_price_engine::cache::RateTier;
    ///
    /// let tier = RateTier {
    ///     upper_weight_bound_grams: 5_000,
    ///     start_price: 200_000,
    ///     start_weight: 500,
    ///     round_size: 100,
    ///     price: 50_000,
    ///     weight_step: 500,
    ///     adjustment: 0,
    ///     description: String::new(),
    /// };
    /// assert_eq!(tier.fee_for_weight(400), 200_000);
    /// // 1_150g rounds to 1_200g: two extra steps of 500g
    /// assert_eq!(tier.fee_for_weight(1_150), 300_000);
    /// ```
    pub fn fee_for_weight(&self, weight: i64) -> i64 {
        let mut weight = weight.max(0);
        if self.round_size > 0 {
            weight = ceil_div(weight, self.round_size).saturating_mul(self.round_size);
        }

        let mut fee = self.start_price;
        if weight > self.start_weight {
            let excess = weight - self.start_weight;
            let steps = if self.weight_step > 0 {
                ceil_div(excess, self.weight_step)
            } else {
                1
            };
            fee = fee.saturating_add(steps.saturating_mul(self.price));
        }

        fee.saturating_add(self.adjustment)
    }
}

fn ceil_div(value: i64, divisor: i64) -> i64 {
    let quotient = value / divisor;
    if value % divisor > 0 {
        quotient + 1
    } else {
        quotient
    }
}

/// Fee schedules grouped by rule key, each sorted by upper weight bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: HashMap<String, Vec<RateTier>>,
}

impl RuleSet {
    /// Builds a rule set from raw rows whose values are JSON-encoded tiers.
    ///
    /// A row that does not decode fails the whole build.
    pub fn from_rows(rows: &[RawConfigRow]) -> EngineResult<Self> {
        let tiers = rows
            .iter()
            .map(|row| {
                serde_json::from_str::<RateTier>(&row.value)
                    .map(|tier| (row.key.clone(), tier))
                    .map_err(|e| {
                        EngineError::invariant(format!(
                            "rate tier row {} for key '{}' does not decode: {}",
                            row.id, row.key, e
                        ))
                    })
            })
            .collect::<EngineResult<Vec<_>>>()?;

        Self::from_tiers(tiers)
    }

    /// Groups tiers by key and sorts each group by upper weight bound.
    ///
    /// Two tiers of one key sharing an upper bound is an invariant violation.
    pub fn from_tiers<I>(tiers: I) -> EngineResult<Self>
    where
        I: IntoIterator<Item = (String, RateTier)>,
    {
        let mut rules: HashMap<String, Vec<RateTier>> = HashMap::new();
        for (key, tier) in tiers {
            rules.entry(key).or_default().push(tier);
        }

        for (key, tiers) in rules.iter_mut() {
            tiers.sort_by_key(|t| t.upper_weight_bound_grams);
            if let Some(pair) = tiers
                .windows(2)
                .find(|w| w[0].upper_weight_bound_grams == w[1].upper_weight_bound_grams)
            {
                return Err(EngineError::invariant(format!(
                    "rule '{}' has two tiers bounded at {}g",
                    key, pair[0].upper_weight_bound_grams
                )));
            }
        }

        Ok(Self { rules })
    }

    /// Returns the first tier of `key` whose bound is at least `weight`.
    pub fn lookup(&self, key: &str, weight: i64) -> Option<&RateTier> {
        let tiers = self.rules.get(key)?;
        let index = tiers.partition_point(|t| t.upper_weight_bound_grams < weight);
        tiers.get(index)
    }

    /// Returns all tiers of `key`.
    pub fn tiers(&self, key: &str) -> Option<&[RateTier]> {
        self.rules.get(key).map(Vec::as_slice)
    }

    /// Returns true if `key` has a schedule.
    pub fn contains_key(&self, key: &str) -> bool {
        self.rules.contains_key(key)
    }

    /// Returns all rule keys in lexicographic order.
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Returns the number of rule keys.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// A [`RuleSet`] cache refreshed from a [`RowSource`] domain.
pub struct TieredRateCache {
    source: Arc<dyn RowSource>,
    batch_size: usize,
    snapshot: SnapshotCache<RuleSet>,
}

impl TieredRateCache {
    /// Creates an empty cache for `domain`.
    pub fn new(domain: &str, source: Arc<dyn RowSource>, batch_size: usize) -> Self {
        Self {
            source,
            batch_size,
            snapshot: SnapshotCache::new(domain),
        }
    }

    /// Pulls all rows of the domain and builds a new rule set without publishing it.
    pub async fn build(&self) -> EngineResult<RuleSet> {
        let rows = fetch_all(self.source.as_ref(), self.snapshot.domain(), self.batch_size).await?;
        RuleSet::from_rows(&rows)
    }

    /// Returns the published rule set.
    pub fn snapshot(&self) -> EngineResult<Arc<RuleSet>> {
        self.snapshot.load()
    }

    /// Looks up the tier covering `weight` for `key`.
    ///
    /// A miss is `Ok(None)`; the only error is a cache that is not warmed up.
    pub fn lookup(&self, key: &str, weight: i64) -> EngineResult<Option<RateTier>> {
        Ok(self.snapshot.load()?.lookup(key, weight).cloned())
    }

    /// Returns true once a rule set has been published.
    pub fn is_ready(&self) -> bool {
        self.snapshot.is_ready()
    }

    /// Returns the number of published rule sets.
    pub fn generation(&self) -> u64 {
        self.snapshot.generation()
    }
}

#[async_trait]
impl Refreshable for TieredRateCache {
    fn domain(&self) -> &str {
        self.snapshot.domain()
    }

    async fn refresh(&self) -> EngineResult<usize> {
        let rule_set = self.build().await?;
        let rule_count = rule_set.len();
        let generation = self.snapshot.publish(rule_set);
        info!(
            domain = %self.snapshot.domain(),
            generation,
            rule_count,
            "Published rule set"
        );
        Ok(rule_count)
    }
}
