use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::AppState;

/// Create the health API router
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Liveness probe
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
