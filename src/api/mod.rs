//! HTTP API module for the SIP price engine.
//!
//! This module exposes price calculation and configuration lookups over
//! REST endpoints.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{DEFAULT_PAGE_SIZE, RulePageParams, TierParams};
pub use response::{AllowListStatus, ApiError, ApiErrorResponse, RulePage, status_for};
pub use state::AppState;
