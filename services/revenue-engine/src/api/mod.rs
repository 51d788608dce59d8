//! HTTP surface over the engine: dashboard, platform reads, transfers.

pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use self::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/platforms", get(handlers::list_platforms))
        .route("/platforms/{id}", get(handlers::get_platform))
        .route("/refresh", post(handlers::trigger_refresh))
        .route(
            "/transfers",
            post(handlers::create_transfer).get(handlers::list_transfers),
        );

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/v1", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
