//! # REST API for Packages
//!
//! The package catalog and selling a package to a player.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use log::info;

use super::error_response;
use super::mappers::package_mapper::PackageMapper;
use crate::AppState;
use shared::SellPackageRequest;

/// Create the package API router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/packages", get(list_catalog))
        .route("/player-packages", post(sell_package))
}

/// List the package catalog
pub async fn list_catalog(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/packages");

    match state.sales_service.list_catalog().await {
        Ok(packages) => (StatusCode::OK, Json(PackageMapper::to_catalog_dto(packages))).into_response(),
        Err(e) => error_response("Failed to list catalog", e),
    }
}

/// Sell a catalog package to a player
pub async fn sell_package(
    State(state): State<AppState>,
    Json(request): Json<SellPackageRequest>,
) -> impl IntoResponse {
    info!("POST /api/player-packages - request: {:?}", request);

    let command = PackageMapper::to_sell_command(request);
    match state.sales_service.sell_package(command).await {
        Ok(result) => (StatusCode::CREATED, Json(PackageMapper::to_sell_dto(result))).into_response(),
        Err(e) => error_response("Failed to sell package", e),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::setup_test_app;
    use axum::http::StatusCode;
    use serde_json::json;
    use shared::{ErrorResponse, PackageCatalogResponse, PlayerDetailResponse, SellPackageResponse};

    #[tokio::test]
    async fn test_catalog_is_sorted_and_formatted() {
        let app = setup_test_app().await;

        let (status, catalog): (_, PackageCatalogResponse) = app.get("/api/packages").await;

        assert_eq!(status, StatusCode::OK);
        let sizes: Vec<i64> = catalog.packages.iter().map(|p| p.sessions_included).collect();
        assert_eq!(sizes, vec![1, 5, 10]);
        assert_eq!(catalog.packages[2].formatted_price, "$160.00");
    }

    #[tokio::test]
    async fn test_sell_package() {
        let app = setup_test_app().await;
        let player_id = app.register("Maya", "Lopez").await;
        let (_, catalog): (_, PackageCatalogResponse) = app.get("/api/packages").await;
        let five_pack = &catalog.packages[1];

        let (status, sold): (_, SellPackageResponse) = app
            .post("/api/player-packages", json!({ "player_id": player_id, "package_id": five_pack.id }))
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sold.success_message, "Sold 5-Session Pack to Maya Lopez.");
        assert_eq!(sold.player_package.sessions_total, 5);
        assert_eq!(sold.player_package.sessions_remaining, 5);
        assert_eq!(sold.player_package.price_cents, five_pack.price_cents);

        let (_, detail): (_, PlayerDetailResponse) = app.get(&format!("/api/players/{}", player_id)).await;
        assert_eq!(detail.active_package.unwrap().id, sold.player_package.id);
    }

    #[tokio::test]
    async fn test_sell_errors() {
        let app = setup_test_app().await;
        let player_id = app.register("Maya", "Lopez").await;

        let (status, error): (_, ErrorResponse) = app
            .post("/api/player-packages", json!({ "player_id": player_id, "package_id": "" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error.error, "Select a package to sell.");

        let (status, error): (_, ErrorResponse) = app
            .post("/api/player-packages", json!({ "player_id": player_id, "package_id": "missing" }))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error.error, "Selected package not found.");
    }
}
