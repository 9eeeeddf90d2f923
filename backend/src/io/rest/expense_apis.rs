//! # REST API for Expenses

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::info;
use serde::Deserialize;

use super::error_response;
use super::mappers::expense_mapper::ExpenseMapper;
use crate::AppState;
use shared::RecordExpenseRequest;

/// Create the expense API router
pub fn router() -> Router<AppState> {
    Router::new().route("/expenses", get(list_expenses).post(record_expense))
}

#[derive(Debug, Deserialize)]
pub struct ExpenseListParams {
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Most recent expenses
pub async fn list_expenses(
    State(state): State<AppState>,
    Query(params): Query<ExpenseListParams>,
) -> impl IntoResponse {
    info!("GET /api/expenses - limit: {:?}", params.limit);

    match state.expense_service.list_recent_expenses(params.limit).await {
        Ok(expenses) => (StatusCode::OK, Json(ExpenseMapper::to_list_dto(expenses))).into_response(),
        Err(e) => error_response("Failed to list expenses", e),
    }
}

/// Log an expense
pub async fn record_expense(
    State(state): State<AppState>,
    Json(request): Json<RecordExpenseRequest>,
) -> impl IntoResponse {
    info!("POST /api/expenses - request: {:?}", request);

    let command = ExpenseMapper::to_command(request);
    match state.expense_service.record_expense(command).await {
        Ok(expense) => (StatusCode::CREATED, Json(ExpenseMapper::to_record_dto(expense))).into_response(),
        Err(e) => error_response("Failed to record expense", e),
    }
}
