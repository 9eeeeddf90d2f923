//! # Camp Ledger Backend
//!
//! Players, session packages, check-ins and expenses for a youth sports camp.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST API, handlers, mappers)
//!     ↓
//! Domain Layer (services, business rules)
//!     ↓
//! Storage Layer (RecordStore: SQLite or in-memory)
//! ```
//!
//! `initialize_backend` wires the layers from an [`AppConfig`];
//! `create_router` exposes them under `/api`.

pub mod clock;
pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use log::{info, warn};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::clock::{Clock, SystemClock};
use crate::config::{AppConfig, ServerConfig};
use crate::domain::{
    AttendanceService, ExpenseService, PackageLedgerService, PackageSalesService, RosterService,
    SummaryService,
};
use crate::storage::{DbConnection, InMemoryRecordStore, RecordStore, SqliteRecordStore};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub ledger_service: PackageLedgerService,
    pub roster_service: RosterService,
    pub sales_service: PackageSalesService,
    pub attendance_service: AttendanceService,
    pub expense_service: ExpenseService,
    pub summary_service: SummaryService,
}

impl AppState {
    /// Build every service over one store and one clock
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>, config: &AppConfig) -> Self {
        let ledger_service = PackageLedgerService::new(store.clone(), clock.clone(), config.ledger);
        let attendance_service = AttendanceService::new(store.clone(), clock.clone());
        let roster_service =
            RosterService::new(store.clone(), ledger_service.clone(), attendance_service.clone());
        let sales_service = PackageSalesService::new(store.clone(), roster_service.clone());
        let expense_service =
            ExpenseService::new(store.clone(), clock.clone(), config.expense_list_limit);
        let summary_service = SummaryService::new(store, clock);

        Self {
            ledger_service,
            roster_service,
            sales_service,
            attendance_service,
            expense_service,
            summary_service,
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let store: Arc<dyn RecordStore> = if config.uses_memory_store() {
        warn!("Using the in-memory store; data is lost on exit");
        Arc::new(InMemoryRecordStore::with_clock(clock.clone()))
    } else {
        info!("Setting up database at {}", config.database_url);
        let db = DbConnection::new(&config.database_url).await?;
        Arc::new(SqliteRecordStore::with_clock(db, clock.clone()))
    };

    info!("Setting up domain services");
    let app_state = AppState::new(store, clock, config);

    let seeded = app_state
        .sales_service
        .seed_catalog(&config.catalog)
        .await
        .context("Failed to seed the package catalog")?;
    if seeded > 0 {
        info!("Added {} packages to the catalog", seeded);
    }

    Ok(app_state)
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, server: &ServerConfig) -> Router {
    // CORS setup to allow frontend to make requests
    let origin = server.cors_origin.as_deref().and_then(|origin| {
        HeaderValue::from_str(origin)
            .map_err(|e| warn!("Ignoring invalid CORS origin {}: {}", origin, e))
            .ok()
    });
    let cors = match origin {
        Some(origin) => CorsLayer::new().allow_origin(origin),
        None => CorsLayer::new().allow_origin(Any),
    }
    .allow_methods([Method::GET, Method::POST])
    .allow_headers(Any);

    Router::new()
        .nest("/api", io::rest::api_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
