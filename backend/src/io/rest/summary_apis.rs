//! # REST API for the Monthly Summary

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
use super::mappers::summary_mapper::SummaryMapper;
use crate::domain::commands::summary::MonthlySummaryQuery;
use crate::AppState;

/// Create the summary API router
pub fn router() -> Router<AppState> {
    Router::new().route("/summary", get(monthly_summary))
}

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
}

/// Revenue, expenses and profit for a month (current month by default)
pub async fn monthly_summary(
    State(state): State<AppState>,
    Query(params): Query<SummaryParams>,
) -> impl IntoResponse {
    info!("GET /api/summary - year: {:?}, month: {:?}", params.year, params.month);

    let query = MonthlySummaryQuery { year: params.year, month: params.month };
    match state.summary_service.monthly_summary(query).await {
        Ok(summary) => (StatusCode::OK, Json(SummaryMapper::to_dto(summary))).into_response(),
        Err(e) => error_response("Failed to build summary", e),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::setup_test_app;
    use axum::http::StatusCode;
    use serde_json::json;
    use shared::{
        ErrorResponse, MonthlySummaryResponse, PackageCatalogResponse, RecordExpenseResponse,
        SellPackageResponse,
    };

    #[tokio::test]
    async fn test_summary_for_current_month() {
        let app = setup_test_app().await;
        let player_id = app.register("Maya", "Lopez").await;
        let (_, catalog): (_, PackageCatalogResponse) = app.get("/api/packages").await;
        let ten_pack = catalog.packages.iter().find(|p| p.sessions_included == 10).unwrap();
        let (_, _sold): (_, SellPackageResponse) = app
            .post("/api/player-packages", json!({ "player_id": player_id, "package_id": ten_pack.id }))
            .await;
        let (_, _expense): (_, RecordExpenseResponse) = app
            .post("/api/expenses", json!({ "category": "Fields", "amount": "60" }))
            .await;
        let (_, _last_month): (_, RecordExpenseResponse) = app
            .post("/api/expenses", json!({ "category": "Fields", "amount": "999", "date": "2024-02-20" }))
            .await;

        let (status, summary): (_, MonthlySummaryResponse) = app.get("/api/summary").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary.month_label, "March 2024");
        assert_eq!(summary.revenue_cents, 16000);
        assert_eq!(summary.expenses_cents, 6000);
        assert_eq!(summary.formatted_profit, "$100.00");
        assert!(summary.warnings.is_empty());

        let (_, february): (_, MonthlySummaryResponse) = app.get("/api/summary?year=2024&month=2").await;
        assert_eq!(february.formatted_profit, "-$999.00");
    }

    #[tokio::test]
    async fn test_invalid_month_is_bad_request() {
        let app = setup_test_app().await;

        let (status, _): (_, ErrorResponse) = app.get("/api/summary?year=2024&month=13").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _): (_, ErrorResponse) =
            app.get("/api/summary?year=2147483647&month=12").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
