//! Property-based tests for the price derivation and tier lookup.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use sip_price_engine::cache::{RateTier, RuleSet};
use sip_price_engine::calculation::{
    compute_affiliate_price, convert_local_price, resolve_real_weight, select_latest_record,
};
use sip_price_engine::config::PricingSettings;
use sip_price_engine::error::EngineError;
use sip_price_engine::models::{
    AffiliateItemRecord, CalculationMode, CalculationQuery, PlatformFees, PriceFactors,
};

fn tier(bound: i64) -> RateTier {
    RateTier {
        upper_weight_bound_grams: bound,
        start_price: bound,
        start_weight: bound,
        round_size: 0,
        price: 0,
        weight_step: 0,
        adjustment: 0,
        description: String::new(),
    }
}

fn factors(fee: Decimal, hidden: Decimal, exchange_rate: Decimal) -> PriceFactors {
    PriceFactors {
        weight: 500,
        country_margin: Decimal::new(5, 2),
        shop_margin: Decimal::new(10, 2),
        item_margin: Decimal::new(2, 2),
        exchange_rate,
        price_ratio: Decimal::new(11, 1),
        hidden_price: hidden,
        currency: "MYR".to_string(),
        fees: PlatformFees {
            service_fee: fee,
            commission_fee: Decimal::ZERO,
            handling_fee: Decimal::ZERO,
        },
    }
}

fn query(price: i64, promotion: Option<i64>) -> CalculationQuery {
    CalculationQuery {
        primary_item_id: 1,
        primary_item_price: price,
        primary_item_weight: 500,
        primary_shop_id: 10,
        primary_region: "SG".to_string(),
        primary_currency: "SGD".to_string(),
        affiliate_item_id: Some(2),
        affiliate_shop_id: 20,
        affiliate_region: "VN".to_string(),
        affiliate_currency: "VND".to_string(),
        promotion_price: promotion,
        mode: CalculationMode::PriceSync,
    }
}

fn decimal_in(range: std::ops::Range<i64>, scale: u32) -> impl Strategy<Value = Decimal> {
    range.prop_map(move |v| Decimal::new(v, scale))
}

proptest! {
    /// Local prices never drop below the floor and carry at most two decimals.
    #[test]
    fn prop_local_price_respects_floor(
        price in decimal_in(1..100_000_000, 2),
        fee in decimal_in(0..200, 2),
        hidden in decimal_in(0..100_000, 2),
        rate in decimal_in(1..10_000_000, 3),
    ) {
        let min_price = Decimal::new(1, 2);
        let result = convert_local_price(price, &factors(fee, hidden, rate), min_price).unwrap();

        prop_assert!(result >= min_price);
        prop_assert!(result.normalize().scale() <= 2);
    }
}

proptest! {
    /// Lookup returns the first tier whose bound covers the weight, or nothing past the last bound.
    #[test]
    fn prop_tier_lookup_matches_linear_scan(
        bounds in prop::collection::btree_set(1i64..100_000, 1..20),
        weight in 0i64..120_000,
    ) {
        let rules = RuleSet::from_tiers(
            bounds.iter().rev().map(|b| ("SG_MY".to_string(), tier(*b))),
        ).unwrap();

        let sorted: Vec<i64> = rules
            .tiers("SG_MY")
            .unwrap()
            .iter()
            .map(|t| t.upper_weight_bound_grams)
            .collect();
        prop_assert!(sorted.windows(2).all(|w| w[0] < w[1]));

        let expected = bounds.iter().copied().find(|b| *b >= weight);
        let found = rules.lookup("SG_MY", weight).map(|t| t.upper_weight_bound_grams);
        prop_assert_eq!(found, expected);
    }

    /// Two tiers with the same bound are always rejected.
    #[test]
    fn prop_duplicate_bounds_rejected(
        bounds in prop::collection::btree_set(1i64..10_000, 1..10),
    ) {
        let duplicate = *bounds.iter().next().unwrap();
        let tiers: Vec<(String, RateTier)> = bounds
            .iter()
            .copied()
            .chain(std::iter::once(duplicate))
            .map(|b| ("K".to_string(), tier(b)))
            .collect();

        let is_invariant_violation = matches!(
            RuleSet::from_tiers(tiers),
            Err(EngineError::InvariantViolation { .. })
        );
        prop_assert!(is_invariant_violation);
    }
}

proptest! {
    /// Identical inputs give identical results, including the audit trace.
    #[test]
    fn prop_affiliate_price_is_deterministic(
        price in 1i64..1_000_000_000,
        promotion in prop::option::of(1i64..1_000_000_000),
        fee in decimal_in(0..50, 2),
        hidden in decimal_in(0..10_000, 2),
        rate in decimal_in(1..2_000_000, 2),
    ) {
        let query = query(price, promotion);
        let factors = factors(fee, hidden, rate);
        let settings = PricingSettings::default();

        let first = compute_affiliate_price(&query, &factors, &settings).unwrap();
        let second = compute_affiliate_price(&query, &factors, &settings).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first.factors, &factors);
    }

    /// A fee sum at or below -1 is an invariant violation, never a price.
    #[test]
    fn prop_fee_sum_guard(
        price in 1i64..1_000_000_000,
        fee in decimal_in(-300..-99, 2),
    ) {
        let result = compute_affiliate_price(
            &query(price, None),
            &factors(fee, Decimal::ZERO, Decimal::ONE),
            &PricingSettings::default(),
        );

        let is_invariant_violation =
            matches!(result, Err(EngineError::InvariantViolation { .. }));
        prop_assert!(is_invariant_violation);
    }
}

proptest! {
    /// The affiliate weight wins whenever it is positive.
    #[test]
    fn prop_real_weight_resolution(
        affiliate in prop::option::of(-1_000i64..10_000),
        primary in 0i64..10_000,
    ) {
        let weight = resolve_real_weight(affiliate, primary);
        match affiliate {
            Some(w) if w > 0 => prop_assert_eq!(weight, w),
            _ => prop_assert_eq!(weight, primary),
        }
    }

    /// The chosen duplicate record does not depend on row order.
    #[test]
    fn prop_latest_record_is_order_independent(
        rows in prop::collection::btree_set((0i64..5, 1u64..1_000), 1..12),
    ) {
        let records: Vec<AffiliateItemRecord> = rows
            .iter()
            .map(|(secs, id)| AffiliateItemRecord {
                id: *id,
                affiliate_item_id: 9,
                primary_item_id: 1,
                item_margin: Decimal::ZERO,
                real_weight: None,
                created_at: Utc.timestamp_opt(*secs, 0).unwrap(),
            })
            .collect();
        let mut reversed = records.clone();
        reversed.reverse();

        let forward = select_latest_record(&records).map(|r| r.id);
        let backward = select_latest_record(&reversed).map(|r| r.id);
        prop_assert_eq!(forward, backward);

        let newest = rows.iter().map(|(secs, _)| *secs).max().unwrap();
        let expected = rows
            .iter()
            .filter(|(secs, _)| *secs == newest)
            .map(|(_, id)| *id)
            .max();
        prop_assert_eq!(forward, expected);
    }
}
