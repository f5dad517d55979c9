use super::generate_handler::generate_handler;
use super::AppState;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate_handler))
        // Health check
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
}
