//! # REST API Interface Layer
//!
//! HTTP endpoints for the camp ledger, all nested under `/api`.
//!
//! ## Status codes
//!
//! - validation failures: 400
//! - unknown player or package: 404
//! - refused same-day check-in: 409
//! - store failures: 500 with the store's message
//! - check-in with a package problem: 201 plus a `warning` field
//!
//! Every error body is a `shared::ErrorResponse`.

pub mod check_in_apis;
pub mod expense_apis;
pub mod health_apis;
pub mod mappers;
pub mod package_apis;
pub mod player_apis;
pub mod summary_apis;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Router,
};
use log::{error, warn};
use shared::ErrorResponse;

use crate::domain::{DomainError, LogicError};
use crate::storage::StoreError;
use crate::AppState;

/// All API routes, relative to `/api`
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(player_apis::router())
        .merge(package_apis::router())
        .merge(check_in_apis::router())
        .merge(expense_apis::router())
        .merge(summary_apis::router())
        .merge(health_apis::router())
}

/// HTTP status for a domain error
pub fn status_for(error: &DomainError) -> StatusCode {
    match error {
        DomainError::Logic(LogicError::AlreadyCheckedIn { .. }) => StatusCode::CONFLICT,
        DomainError::Logic(logic) if logic.is_not_found() => StatusCode::NOT_FOUND,
        DomainError::Logic(_) => StatusCode::BAD_REQUEST,
        DomainError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
        DomainError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Log and convert a domain error into a JSON error response
pub fn error_response(context: &str, error: DomainError) -> Response {
    let status = status_for(&error);
    if status.is_server_error() {
        error!("{}: {}", context, error);
    } else {
        warn!("{}: {}", context, error);
    }
    (status, Json(ErrorResponse { error: error.to_string() })).into_response()
}
