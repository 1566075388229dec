//! API Routes
//!
//! Configures the Axum router with all cache service endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_handler, get_handler, health_handler, set_handler, stats_handler,
    sweep_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /cache/:key` - Read through both tiers
/// - `PUT /cache/:key` - Write through both tiers
/// - `DELETE /cache/:key` - Delete from both tiers
/// - `DELETE /cache` - Clear both tiers
/// - `POST /cache/sweep` - Sweep expired fast-tier entries
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cache", delete(clear_handler))
        .route("/cache/sweep", post(sweep_handler))
        .route(
            "/cache/:key",
            get(get_handler).put(set_handler).delete(delete_handler),
        )
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
