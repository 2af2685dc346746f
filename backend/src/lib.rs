pub mod candidates;
pub mod config;
pub mod error;
pub mod handlers;
pub mod matcher;
pub mod models;
pub mod osrm;
pub mod polyline;
pub mod routing;
pub mod scoring;
pub mod search;
pub mod store;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::osrm::OsrmClient;
use crate::search::SearchConfig;
use crate::store::MemoryStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
    /// `None` disables OSRM; trips then always get straight-line geometry.
    pub osrm: Option<Arc<OsrmClient>>,
    pub search: SearchConfig,
}

impl AppState {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store: Arc::new(store),
            osrm: None,
            search: SearchConfig::default(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::health))
        .route("/api/path/search", post(handlers::search_path))
        .route("/api/routes", post(handlers::routes_preview))
        .route(
            "/api/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/api/segments",
            get(handlers::list_segments).post(handlers::create_segment),
        )
        .route(
            "/api/segments/:id/status",
            post(handlers::update_segment_status),
        )
        // older clients post status changes here
        .route(
            "/api/segments/:id/apply-detection",
            post(handlers::update_segment_status),
        )
        .route(
            "/api/segments/:id/reports",
            get(handlers::list_reports).post(handlers::create_report),
        )
        .route(
            "/api/segments/:id/aggregate",
            get(handlers::segment_aggregate),
        )
        .route(
            "/api/segments/:id/auto-confirm-reports",
            post(handlers::auto_confirm_reports),
        )
        .route("/api/reports/:id/confirm", post(handlers::confirm_report))
        .route(
            "/api/reports/batch-confirm",
            post(handlers::batch_confirm_reports),
        )
        .route(
            "/api/trips",
            get(handlers::list_trips).post(handlers::create_trip),
        )
        .route(
            "/api/trips/:id",
            get(handlers::get_trip).delete(handlers::delete_trip),
        )
        .route("/api/stats", get(handlers::stats))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
