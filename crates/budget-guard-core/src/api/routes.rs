//! API routes

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers::{self, AppState};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health))

        // Pub/Sub push deliveries
        .route("/", post(handlers::receive_push))
        .route("/pubsub/push", post(handlers::receive_push))

        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
