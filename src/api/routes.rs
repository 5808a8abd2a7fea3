//! HTTP API route definitions.

use axum::{http::Method, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{frames, health, AppState};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Liveness
        .route("/", get(health))
        // Device polling endpoint
        .route("/metrics", get(frames))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods([Method::GET]))
        .with_state(state)
}
