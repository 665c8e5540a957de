//! artistalbum-bandas library - Bands service
//!
//! CRUD over bands and their many-to-many links to artists, with change
//! notifications pushed to the EventBus.

use artistalbum_common::events::{ChangePublisher, EventBus};
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod pagination;
pub mod services;
pub mod validation;

pub use crate::error::{ApiError, ApiResult};
use crate::services::BandService;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event bus feeding the SSE endpoint
    pub event_bus: EventBus,
    pub bands: Arc<BandService>,
}

impl AppState {
    /// State whose band service publishes to `event_bus`
    pub fn new(db: SqlitePool, event_bus: EventBus) -> Self {
        let publisher: Arc<dyn ChangePublisher> = Arc::new(event_bus.clone());
        Self::with_publisher(db, event_bus, publisher)
    }

    /// State with a custom publisher for the band service
    pub fn with_publisher(
        db: SqlitePool,
        event_bus: EventBus,
        publisher: Arc<dyn ChangePublisher>,
    ) -> Self {
        let bands = Arc::new(BandService::new(db.clone(), publisher));
        Self {
            db,
            event_bus,
            bands,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::band_routes())
        .route("/v1/updates", get(api::event_stream))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
