//! # REST API for Check-ins
//!
//! A check-in always answers 201 once the attendance record is written. If
//! the package side went wrong the body carries a `warning` to show the user.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use log::{debug, info};

use super::error_response;
use super::mappers::check_in_mapper::{AttendanceMapper, CheckInMapper};
use crate::domain::commands::ledger::CheckInCommand;
use crate::domain::LogicError;
use crate::AppState;
use shared::CheckInRequest;

/// Create the check-in API router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/check-ins", post(check_in))
        .route("/check-ins/today", get(todays_check_ins))
}

/// Check a player in for today
pub async fn check_in(
    State(state): State<AppState>,
    Json(request): Json<CheckInRequest>,
) -> impl IntoResponse {
    info!("POST /api/check-ins - request: {:?}", request);

    if request.player_id.trim().is_empty() {
        return error_response("Rejected check-in", LogicError::MissingPlayer.into());
    }

    let player = match state.roster_service.get_player(request.player_id.trim()).await {
        Ok(player) => player,
        Err(e) => return error_response("Failed to check in", e),
    };

    // Reuse the package the client already showed; the guarded update copes
    // with it being stale
    let active_package = match request.active_package_id.as_deref() {
        Some(package_id) => match state.ledger_service.get_player_package(package_id).await {
            Ok(found) => found,
            Err(e) => {
                debug!("Could not load supplied package {}: {}", package_id, e);
                None
            }
        },
        None => None,
    };

    let command = CheckInCommand { player_id: player.id.clone(), active_package };
    match state.ledger_service.check_in(command).await {
        Ok(result) => {
            (StatusCode::CREATED, Json(CheckInMapper::to_dto(&player, result))).into_response()
        }
        Err(e) => error_response("Failed to check in", e),
    }
}

/// Today's check-ins, newest first
pub async fn todays_check_ins(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/check-ins/today");

    let result = state.attendance_service.todays_check_ins().await;
    (StatusCode::OK, Json(AttendanceMapper::to_today_dto(result))).into_response()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{setup_test_app, setup_test_app_with, TestApp};
    use crate::config::AppConfig;
    use crate::domain::LedgerPolicy;
    use axum::http::StatusCode;
    use serde_json::json;
    use shared::{
        ActivePackageResponse, CheckInOutcome, CheckInResponse, ErrorResponse,
        PackageCatalogResponse, SellPackageResponse, TodayCheckInsResponse,
    };

    async fn sell(app: &TestApp, player_id: &str, sessions: i64) -> String {
        let (_, catalog): (_, PackageCatalogResponse) = app.get("/api/packages").await;
        let package = catalog
            .packages
            .iter()
            .find(|p| p.sessions_included == sessions)
            .expect("no such catalog package");
        let (status, sold): (_, SellPackageResponse) = app
            .post("/api/player-packages", json!({ "player_id": player_id, "package_id": package.id }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        sold.player_package.id
    }

    #[tokio::test]
    async fn test_check_in_uses_last_session_then_drops_in() {
        let app = setup_test_app().await;
        let player_id = app.register("Maya", "Lopez").await;
        let package_id = sell(&app, &player_id, 1).await;

        let (status, first): (_, CheckInResponse) = app
            .post("/api/check-ins", json!({ "player_id": player_id, "active_package_id": package_id }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            first.outcome,
            CheckInOutcome::PackageDecremented {
                package_id: package_id.clone(),
                sessions_used: 1,
                sessions_total: 1,
                sessions_remaining: 0,
            }
        );
        assert_eq!(first.success_message, "Checked in Maya Lopez for today. Session deducted from their package.");
        assert_eq!(first.attendance.date, "2024-03-15");

        let (_, active): (_, ActivePackageResponse) =
            app.get(&format!("/api/players/{}/active-package", player_id)).await;
        assert!(active.active_package.is_none());

        let (status, second): (_, CheckInResponse) =
            app.post("/api/check-ins", json!({ "player_id": player_id })).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(second.outcome, CheckInOutcome::DropIn);
        assert_eq!(second.success_message, "Checked in Maya Lopez for today. (No active package on file.)");

        let (_, today): (_, TodayCheckInsResponse) = app.get("/api/check-ins/today").await;
        assert_eq!(today.date, "2024-03-15");
        assert_eq!(today.check_ins.len(), 2);
        assert!(today.check_ins.iter().all(|c| c.player_name == "Maya Lopez"));
    }

    #[tokio::test]
    async fn test_stale_package_id_reports_became_full() {
        let app = setup_test_app().await;
        let player_id = app.register("Maya", "Lopez").await;
        let package_id = sell(&app, &player_id, 1).await;

        let body = json!({ "player_id": player_id, "active_package_id": package_id });
        let (_, _first): (_, CheckInResponse) = app.post("/api/check-ins", body.clone()).await;
        let (status, second): (_, CheckInResponse) = app.post("/api/check-ins", body).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(second.outcome, CheckInOutcome::PackageBecameFull { package_id });
        assert!(second.warning.is_some());
    }

    #[tokio::test]
    async fn test_check_in_unknown_or_missing_player() {
        let app = setup_test_app().await;

        let (status, _): (_, ErrorResponse) =
            app.post("/api/check-ins", json!({ "player_id": "nobody" })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, error): (_, ErrorResponse) = app.post("/api/check-ins", json!({ "player_id": " " })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error.error, "Select a player first.");
    }

    #[tokio::test]
    async fn test_duplicate_same_day_is_conflict_when_disabled() {
        let config = AppConfig {
            ledger: LedgerPolicy { allow_duplicate_same_day_check_in: false },
            ..AppConfig::default()
        };
        let app = setup_test_app_with(config).await;
        let player_id = app.register("Maya", "Lopez").await;

        let (status, _): (_, CheckInResponse) =
            app.post("/api/check-ins", json!({ "player_id": player_id })).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _): (_, ErrorResponse) =
            app.post("/api/check-ins", json!({ "player_id": player_id })).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, today): (_, TodayCheckInsResponse) = app.get("/api/check-ins/today").await;
        assert_eq!(today.check_ins.len(), 1);
    }
}
