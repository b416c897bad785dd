//! HTTP request handlers for the SIP price engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{CalculationQuery, CalculationResult};
use crate::stores::{ConfigInfoQuery, HIDDEN_FEE_EXEMPT_DOMAIN};

use super::request::{RulePageParams, TierParams};
use super::response::{AllowListStatus, ApiError, ApiErrorResponse, RulePage};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/affiliate-price", post(affiliate_price_handler))
        .route("/local-price", post(local_price_handler))
        .route("/hidden-fee/rules", get(list_rules_handler))
        .route("/hidden-fee/:rule_key/tier", get(tier_handler))
        .route("/allow-list/:id", get(allow_list_handler))
        .route("/config-info", post(config_info_handler))
        .route("/ready", get(ready_handler))
        .with_state(state)
}

/// Handler for POST /affiliate-price.
async fn affiliate_price_handler(
    State(state): State<AppState>,
    payload: Result<Json<CalculationQuery>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing affiliate price request");

    let query = match payload {
        Ok(Json(query)) => query,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    let outcome = state.service().compute_affiliate_price(&query).await;
    calculation_response(correlation_id, &query, outcome, start_time)
}

/// Handler for POST /local-price.
async fn local_price_handler(
    State(state): State<AppState>,
    payload: Result<Json<CalculationQuery>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing local price request");

    let query = match payload {
        Ok(Json(query)) => query,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    let outcome = state.service().compute_local_item_price(&query).await;
    calculation_response(correlation_id, &query, outcome, start_time)
}

/// Handler for GET /hidden-fee/:rule_key/tier?weight=.
async fn tier_handler(
    State(state): State<AppState>,
    Path(rule_key): Path<String>,
    params: Result<Query<TierParams>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => return query_rejection_response(correlation_id, rejection),
    };

    respond(
        correlation_id,
        state
            .service()
            .lookup_hidden_fee_tier(&rule_key, params.weight),
    )
}

/// Handler for GET /hidden-fee/rules?page_index=&page_size=.
async fn list_rules_handler(
    State(state): State<AppState>,
    params: Result<Query<RulePageParams>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => return query_rejection_response(correlation_id, rejection),
    };

    let page = state
        .service()
        .list_hidden_fee_rules(params.page_index, params.page_size)
        .map(|(rules, total)| RulePage {
            rules,
            total,
            page_index: params.page_index,
            page_size: params.page_size,
        });
    respond(correlation_id, page)
}

/// Handler for GET /allow-list/:id.
async fn allow_list_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if !state.service().stores().allow_list.is_ready() {
        let error = EngineError::CacheNotReady {
            domain: HIDDEN_FEE_EXEMPT_DOMAIN.to_string(),
        };
        return error_response(Uuid::new_v4(), error);
    }

    let allow_listed = state.service().is_allow_listed(&id);
    (StatusCode::OK, Json(AllowListStatus { id, allow_listed })).into_response()
}

/// Handler for POST /config-info.
async fn config_info_handler(
    State(state): State<AppState>,
    payload: Result<Json<ConfigInfoQuery>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let query = match payload {
        Ok(Json(query)) => query,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    respond(correlation_id, state.service().config_info(&query))
}

/// Handler for GET /ready: 200 once every store has loaded, 503 before.
async fn ready_handler(State(state): State<AppState>) -> StatusCode {
    if state.service().is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

fn calculation_response(
    correlation_id: Uuid,
    query: &CalculationQuery,
    outcome: EngineResult<CalculationResult>,
    start_time: Instant,
) -> Response {
    match outcome {
        Ok(result) => {
            info!(
                correlation_id = %correlation_id,
                primary_item_id = query.primary_item_id,
                normal_price = result.normal_price,
                duration_us = start_time.elapsed().as_micros() as u64,
                "Calculation completed successfully"
            );
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(err) => error_response(correlation_id, err),
    }
}

fn respond<T: serde::Serialize>(correlation_id: Uuid, outcome: EngineResult<T>) -> Response {
    match outcome {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => error_response(correlation_id, err),
    }
}

fn error_response(correlation_id: Uuid, err: EngineError) -> Response {
    warn!(
        correlation_id = %correlation_id,
        error = %err,
        "Request failed"
    );
    ApiErrorResponse::from(err).into_response()
}

fn json_rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::new("VALIDATION_ERROR", body_text)
            } else {
                ApiError::malformed_request(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_request(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_request("Failed to parse request body"),
    };

    ApiErrorResponse {
        status: StatusCode::BAD_REQUEST,
        error,
    }
    .into_response()
}

fn query_rejection_response(correlation_id: Uuid, rejection: QueryRejection) -> Response {
    let body_text = rejection.body_text();
    warn!(
        correlation_id = %correlation_id,
        error = %body_text,
        "Query string error"
    );
    ApiErrorResponse {
        status: StatusCode::BAD_REQUEST,
        error: ApiError::malformed_request(body_text),
    }
    .into_response()
}
