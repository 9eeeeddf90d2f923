//! # REST API for Players
//!
//! Roster listing, search, registration, player detail and the player's
//! current active package.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::info;
use serde::Deserialize;

use super::error_response;
use super::mappers::package_mapper::PackageMapper;
use super::mappers::player_mapper::PlayerMapper;
use crate::AppState;
use shared::RegisterPlayerRequest;

/// Create the player API router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/players", get(list_players).post(register_player))
        .route("/players/search", get(search_players))
        .route("/players/:id", get(get_player_detail))
        .route("/players/:id/active-package", get(get_active_package))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

/// List all players with their active packages
pub async fn list_players(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/players");

    let result = state.roster_service.list_players().await;
    (StatusCode::OK, Json(PlayerMapper::to_list_dto(result))).into_response()
}

/// Search players by name or phone
pub async fn search_players(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    info!("GET /api/players/search - q: {:?}", params.q);

    let result = state
        .roster_service
        .search_players(params.q.as_deref().unwrap_or_default())
        .await;
    (StatusCode::OK, Json(PlayerMapper::to_search_dto(result))).into_response()
}

/// Register a new player
pub async fn register_player(
    State(state): State<AppState>,
    Json(request): Json<RegisterPlayerRequest>,
) -> impl IntoResponse {
    info!("POST /api/players - request: {:?}", request);

    let command = PlayerMapper::to_register_command(request);
    match state.roster_service.register_player(command).await {
        Ok(player) => (StatusCode::CREATED, Json(PlayerMapper::to_register_dto(player))).into_response(),
        Err(e) => error_response("Failed to register player", e),
    }
}

/// Get a player with purchases and attendance history
pub async fn get_player_detail(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/players/{}", player_id);

    match state.roster_service.get_player_detail(&player_id).await {
        Ok(detail) => (StatusCode::OK, Json(PlayerMapper::to_detail_dto(detail))).into_response(),
        Err(e) => error_response("Failed to load player", e),
    }
}

/// The package the player's next check-in would consume
pub async fn get_active_package(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/players/{}/active-package", player_id);

    match state.ledger_service.find_active_package(&player_id).await {
        Ok(active) => (StatusCode::OK, Json(PackageMapper::to_active_package_dto(active))).into_response(),
        Err(e) => error_response("Failed to find active package", e),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::setup_test_app;
    use axum::http::StatusCode;
    use serde_json::json;
    use shared::{
        ActivePackageResponse, ErrorResponse, PlayerDetailResponse, PlayerListResponse,
        PlayerSearchResponse, RegisterPlayerResponse,
    };

    #[tokio::test]
    async fn test_register_and_search() {
        let app = setup_test_app().await;

        let (status, created): (_, RegisterPlayerResponse) = app
            .post("/api/players", json!({ "first_name": " Maya ", "last_name": "Lopez", "phone": "555-0101" }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.player.first_name, "Maya");
        assert_eq!(created.success_message, "Player Maya Lopez registered successfully.");

        let (status, found): (_, PlayerSearchResponse) = app.get("/api/players/search?q=lop").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found.players.len(), 1);
        assert!(found.message.is_none());

        let (_, empty): (_, PlayerSearchResponse) = app.get("/api/players/search?q=").await;
        assert!(empty.players.is_empty());
        assert!(empty.message.is_none());

        let (_, none): (_, PlayerSearchResponse) = app.get("/api/players/search?q=zzz").await;
        assert_eq!(none.message.as_deref(), Some("No players found. Try a different name or phone."));
    }

    #[tokio::test]
    async fn test_register_validation_is_bad_request() {
        let app = setup_test_app().await;

        let (status, error): (_, ErrorResponse) = app
            .post("/api/players", json!({ "first_name": "Maya", "last_name": "" }))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error.error, "First name and last name are required.");
    }

    #[tokio::test]
    async fn test_list_detail_and_active_package() {
        let app = setup_test_app().await;
        let player_id = app.register("Maya", "Lopez").await;

        let (_, active): (_, ActivePackageResponse) =
            app.get(&format!("/api/players/{}/active-package", player_id)).await;
        assert!(active.active_package.is_none());

        let (status, list): (_, PlayerListResponse) = app.get("/api/players").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.players.len(), 1);
        assert_eq!(list.players[0].player.id, player_id);

        let (status, detail): (_, PlayerDetailResponse) = app.get(&format!("/api/players/{}", player_id)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(detail.packages.is_empty());
        assert!(detail.attendance.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_player_is_not_found() {
        let app = setup_test_app().await;

        let (status, error): (_, ErrorResponse) = app.get("/api/players/nobody").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(error.error.contains("nobody"));
    }
}
