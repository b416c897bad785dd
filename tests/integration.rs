//! Integration tests for the SIP price engine HTTP API.
//!
//! This test suite covers:
//! - Cross-border affiliate price calculation
//! - Local item price calculation
//! - Create-flow tolerance of missing mapping records
//! - Hidden-fee tier lookup and rule listing
//! - Allow-list and config-info queries
//! - Error mapping (validation, not found, invariant, not ready)

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use sip_price_engine::api::{AppState, create_router};
use sip_price_engine::cache::{InMemoryRowSource, RateTier, RawConfigRow};
use sip_price_engine::config::{ConfigLoader, EngineSettings};
use sip_price_engine::models::{AffiliateItemRecord, PlatformFees};
use sip_price_engine::resolver::{
    Collaborators, InMemoryCollaborators, PersistenceSink, PriceService,
};
use sip_price_engine::stores::{
    ConfigStores, HIDDEN_FEE_DOMAIN, HIDDEN_FEE_EXEMPT_DOMAIN, REGION_RATE_DOMAIN,
};

// =============================================================================
// Test Helpers
// =============================================================================

fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn tier_row(id: u64, key: &str, bound: i64, start_price: i64, description: &str) -> RawConfigRow {
    let tier = RateTier {
        upper_weight_bound_grams: bound,
        start_price,
        start_weight: 500,
        round_size: 100,
        price: 50_000,
        weight_step: 500,
        adjustment: 0,
        description: description.to_string(),
    };
    RawConfigRow {
        id,
        key: key.to_string(),
        value: serde_json::to_string(&tier).unwrap(),
    }
}

async fn seed_source() -> Arc<InMemoryRowSource> {
    let source = Arc::new(InMemoryRowSource::new());
    source
        .replace(
            HIDDEN_FEE_DOMAIN,
            vec![
                tier_row(1, "SG_MY", 500, 250_000, "light"),
                tier_row(2, "SG_MY", 5_000, 250_000, "heavy"),
                tier_row(3, "SG_VN", 5_000, 100_000, "vn"),
                tier_row(4, "DEFAULT_TH", 5_000, 100_000, "local"),
            ],
        )
        .await;
    source
        .replace(
            REGION_RATE_DOMAIN,
            vec![RawConfigRow {
                id: 1,
                key: "region_rate".to_string(),
                value: r#"{"SG": {"MY": {"price_ratio": "1.1"}, "VN": {"price_ratio": "1"}}}"#
                    .to_string(),
            }],
        )
        .await;
    source
        .replace(
            HIDDEN_FEE_EXEMPT_DOMAIN,
            vec![RawConfigRow {
                id: 1,
                key: "777".to_string(),
                value: String::new(),
            }],
        )
        .await;
    source
}

async fn seed_collaborators() -> Arc<InMemoryCollaborators> {
    let collaborators = Arc::new(InMemoryCollaborators::new());
    collaborators
        .upsert_shop_margin(20, decimal("0.10"))
        .await
        .unwrap();
    collaborators
        .upsert_shop_margin(21, decimal("0"))
        .await
        .unwrap();
    collaborators
        .set_exchange_rate("SGD", "MYR", decimal("3"))
        .await;
    collaborators
        .set_exchange_rate("SGD", "VND", decimal("18000"))
        .await;
    collaborators
        .set_exchange_rate("THB", "THB", decimal("1"))
        .await;
    collaborators
        .set_country_margin("SG", "MY", decimal("0.05"))
        .await;
    collaborators
        .set_country_margin("SG", "VN", decimal("0"))
        .await;
    collaborators
        .set_platform_fees(
            20,
            PlatformFees {
                service_fee: decimal("0.02"),
                commission_fee: decimal("0.03"),
                handling_fee: decimal("0.01"),
            },
        )
        .await;
    collaborators
        .set_platform_fees(
            21,
            PlatformFees {
                service_fee: decimal("-1.2"),
                commission_fee: Decimal::ZERO,
                handling_fee: Decimal::ZERO,
            },
        )
        .await;
    collaborators
        .set_local_fees(
            20,
            PlatformFees {
                service_fee: decimal("0.1"),
                commission_fee: Decimal::ZERO,
                handling_fee: Decimal::ZERO,
            },
        )
        .await;
    collaborators
        .insert_record(AffiliateItemRecord {
            id: 1,
            affiliate_item_id: 2,
            primary_item_id: 1,
            item_margin: decimal("0.02"),
            real_weight: Some(400),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        })
        .await;
    collaborators
}

async fn create_router_for_test() -> Router {
    let settings = ConfigLoader::from_yaml_str("request_timeout_ms: 500\n", "test")
        .unwrap()
        .into_settings();
    let stores = ConfigStores::new(seed_source().await, &settings.cache);
    stores
        .start(&settings.cache, CancellationToken::new())
        .await
        .unwrap();
    let collaborators = Collaborators::from_shared(seed_collaborators().await);
    create_router(AppState::new(PriceService::new(
        settings,
        stores,
        collaborators,
    )))
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}

fn sync_query() -> Value {
    json!({
        "primary_item_id": 1,
        "primary_item_price": 100000,
        "primary_item_weight": 3000,
        "primary_shop_id": 10,
        "primary_region": "SG",
        "primary_currency": "SGD",
        "affiliate_item_id": 2,
        "affiliate_shop_id": 20,
        "affiliate_region": "MY",
        "affiliate_currency": "MYR"
    })
}

// =============================================================================
// Affiliate price
// =============================================================================

#[tokio::test]
async fn test_affiliate_price_reference_scenario() {
    let router = create_router_for_test().await;

    let (status, body) = post_json(router, "/affiliate-price", sync_query()).await;

    assert_eq!(status, StatusCode::OK);
    // (1 * 1.1 * 1.17 + 2.5) * 3 / 1.06 = 10.7179 -> 10.72 MYR
    assert_eq!(body["normal_price"], 1_072_000);
    assert_eq!(body["settlement_price"], 110_000);
    assert_eq!(body["settlement_currency"], "SGD");
    assert_eq!(body["promotion_price"], Value::Null);
    assert_eq!(body["factors"]["weight"], 400);
    assert_eq!(
        decimal(body["factors"]["hidden_price"].as_str().unwrap()),
        decimal("2.5")
    );
    assert_eq!(body["factors"]["price_ratio"], "1.1");
    assert_eq!(body["factors"]["fees"]["commission_fee"], "0.03");
}

#[tokio::test]
async fn test_affiliate_price_with_promotion() {
    let router = create_router_for_test().await;
    let mut query = sync_query();
    query["promotion_price"] = json!(50000);

    let (status, body) = post_json(router, "/affiliate-price", query).await;

    assert_eq!(status, StatusCode::OK);
    // (0.5 * 1.1 * 1.17 + 2.5) * 3 / 1.06 = 8.8966 -> 8.90 MYR
    assert_eq!(body["promotion_price"], 890_000);
    let steps = body["audit_trace"]["steps"].as_array().unwrap();
    assert!(steps.iter().any(|s| s["rule_id"] == "promotion_ratio"));
}

#[tokio::test]
async fn test_vn_promotion_ratio_is_capped() {
    let router = create_router_for_test().await;
    let mut query = sync_query();
    query["affiliate_region"] = json!("VN");
    query["affiliate_currency"] = json!("VND");
    query["promotion_price"] = json!(25000);

    let (status, body) = post_json(router, "/affiliate-price", query).await;

    assert_eq!(status, StatusCode::OK);
    // normal: (1 * 1 * 1.12 + 1) * 18000 / 1.06 = 36000 VND
    // promotion ratio 4 capped at 2: (0.5 * 1.12 + 1) * 18000 / 1.06 = 26490.57 -> 26491
    assert_eq!(body["normal_price"], 3_600_000_000_i64);
    assert_eq!(body["promotion_price"], 2_649_100_000_i64);
}

#[tokio::test]
async fn test_create_flow_without_record() {
    let router = create_router_for_test().await;
    let mut query = sync_query();
    query["affiliate_item_id"] = json!(null);
    query["mode"] = json!("for_create");

    let (status, body) = post_json(router, "/affiliate-price", query).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["factors"]["weight"], 3000);
    assert_eq!(decimal(body["factors"]["item_margin"].as_str().unwrap()), Decimal::ZERO);
}

#[tokio::test]
async fn test_sync_without_record_is_not_found() {
    let router = create_router_for_test().await;
    let mut query = sync_query();
    query["affiliate_item_id"] = json!(404);

    let (status, body) = post_json(router, "/affiliate-price", query).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_allow_listed_primary_shop_pays_no_hidden_fee() {
    let router = create_router_for_test().await;
    let mut query = sync_query();
    query["primary_shop_id"] = json!(777);

    let (status, body) = post_json(router, "/affiliate-price", query).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(body["factors"]["hidden_price"].as_str().unwrap()), Decimal::ZERO);
}

#[tokio::test]
async fn test_fee_sum_guard_is_internal_error() {
    let router = create_router_for_test().await;
    let mut query = sync_query();
    query["affiliate_shop_id"] = json!(21);

    let (status, body) = post_json(router, "/affiliate-price", query).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "INVARIANT_VIOLATION");
}

#[tokio::test]
async fn test_non_positive_price_is_rejected() {
    let router = create_router_for_test().await;
    let mut query = sync_query();
    query["primary_item_price"] = json!(0);

    let (status, body) = post_json(router, "/affiliate-price", query).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_PARAMETER");
}

#[tokio::test]
async fn test_negative_weight_is_rejected() {
    let router = create_router_for_test().await;
    let mut query = sync_query();
    query["primary_item_weight"] = json!(-5000);

    let (status, body) = post_json(router, "/affiliate-price", query).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_PARAMETER");
}

#[tokio::test]
async fn test_missing_field_is_validation_error() {
    let router = create_router_for_test().await;
    let mut query = sync_query();
    query.as_object_mut().unwrap().remove("primary_region");

    let (status, body) = post_json(router, "/affiliate-price", query).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let router = create_router_for_test().await;
    let request = Request::builder()
        .method("POST")
        .uri("/affiliate-price")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MALFORMED_REQUEST");
}

// =============================================================================
// Local price
// =============================================================================

#[tokio::test]
async fn test_local_price_conversion() {
    let router = create_router_for_test().await;
    let query = json!({
        "primary_item_id": 1,
        "primary_item_price": 10000000,
        "primary_item_weight": 300,
        "primary_shop_id": 10,
        "primary_region": "TH",
        "primary_currency": "THB",
        "affiliate_item_id": 2,
        "affiliate_shop_id": 20,
        "affiliate_region": "TH",
        "affiliate_currency": "THB"
    });

    let (status, body) = post_json(router, "/local-price", query).await;

    assert_eq!(status, StatusCode::OK);
    // 100 * 0.9 - 1 = 89 THB
    assert_eq!(body["normal_price"], 8_900_000);
    assert_eq!(body["settlement_price"], 10_000_000);
}

#[tokio::test]
async fn test_local_price_rejects_cross_border_query() {
    let router = create_router_for_test().await;

    let (status, _) = post_json(router, "/local-price", sync_query()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Configuration lookups
// =============================================================================

#[tokio::test]
async fn test_hidden_fee_tier_lookup() {
    let router = create_router_for_test().await;

    let (status, body) = get(router.clone(), "/hidden-fee/SG_MY/tier?weight=500").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "light");

    let (status, body) = get(router.clone(), "/hidden-fee/SG_MY/tier?weight=501").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "heavy");

    let (status, _) = get(router.clone(), "/hidden-fee/SG_MY/tier?weight=5001").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(router, "/hidden-fee/SG_MY/tier?weight=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_hidden_fee_rules_pagination() {
    let router = create_router_for_test().await;

    let (status, body) = get(router.clone(), "/hidden-fee/rules?page_index=1&page_size=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    let rules = body["rules"].as_array().unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0]["rule_key"], "SG_VN");

    let (status, body) = get(router, "/hidden-fee/rules?page_index=9").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["rules"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_hidden_fee_rules_zero_page_size_is_empty() {
    let router = create_router_for_test().await;

    let (status, body) = get(router, "/hidden-fee/rules?page_size=0").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert!(body["rules"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_allow_list_lookup() {
    let router = create_router_for_test().await;

    let (status, body) = get(router.clone(), "/allow-list/777").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allow_listed"], true);

    let (_, body) = get(router, "/allow-list/10").await;
    assert_eq!(body["allow_listed"], false);
}

#[tokio::test]
async fn test_config_info_queries() {
    let router = create_router_for_test().await;

    let (status, body) = post_json(
        router.clone(),
        "/config-info",
        json!({ "info_type": "region_rate", "source": "sg", "destination": "my" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info_type"], "region_rate");
    assert_eq!(body["data"]["price_ratio"], "1.1");

    let (status, _) = post_json(
        router,
        "/config-info",
        json!({ "info_type": "hidden_fee_rule", "rule_key": "XX_YY" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unstarted_stores_report_not_ready() {
    let settings = EngineSettings::default();
    let stores = ConfigStores::new(seed_source().await, &settings.cache);
    let collaborators = Collaborators::from_shared(seed_collaborators().await);
    let router = create_router(AppState::new(PriceService::new(
        settings,
        stores,
        collaborators,
    )));

    let (status, _) = get(router.clone(), "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, body) = get(router.clone(), "/hidden-fee/rules").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "CACHE_NOT_READY");

    let (status, _) = post_json(router, "/affiliate-price", sync_query()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
