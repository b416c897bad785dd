//! Response types for the SIP price engine API.
//!
//! This module defines the error response structures, the mapping from
//! [`EngineError`] to HTTP status codes, and the listing/lookup bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, ErrorKind};
use crate::stores::RuleBrief;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a malformed request error response.
    pub fn malformed_request(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_REQUEST", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

/// Maps an error kind to its HTTP status.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Parameter => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::External => StatusCode::BAD_GATEWAY,
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let status = status_for(error.kind());
        let message = error.to_string();
        let error = match error {
            EngineError::InvalidParameter { field, .. } => ApiError::with_details(
                "INVALID_PARAMETER",
                message,
                format!("Check the value of '{}'", field),
            ),
            EngineError::NotFound { entity, .. } => ApiError::with_details(
                "NOT_FOUND",
                message,
                format!("No {} is configured for this request", entity.to_lowercase()),
            ),
            EngineError::InvariantViolation { .. } => ApiError::new("INVARIANT_VIOLATION", message),
            EngineError::ExternalService { service, .. } => ApiError::with_details(
                "EXTERNAL_SERVICE_ERROR",
                message,
                format!("Collaborator '{}' did not answer", service),
            ),
            EngineError::CacheNotReady { .. } => ApiError::new("CACHE_NOT_READY", message),
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                ApiError::new("CONFIG_ERROR", message)
            }
        };
        ApiErrorResponse { status, error }
    }
}

/// One page of hidden-fee rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulePage {
    /// Rule summaries in key order.
    pub rules: Vec<RuleBrief>,
    /// Total number of rules.
    pub total: usize,
    /// The zero-based page index.
    pub page_index: usize,
    /// The page size.
    pub page_size: usize,
}

/// Allow-list membership of an identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowListStatus {
    /// The identifier looked up.
    pub id: String,
    /// Whether the identifier is listed.
    pub allow_listed: bool,
}
