use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Recording control
        .route("/capture/record/start", post(handlers::start_recording))
        .route("/capture/record/stop", post(handlers::stop_recording))
        .route("/capture/state", get(handlers::recording_state))
        .route("/capture/reset", post(handlers::reset_capture))
        // Screenshot + manual artifact fallback
        .route("/capture/screenshot", post(handlers::take_screenshot))
        .route("/capture/artifact/:kind", get(handlers::download_artifact))
        // Window queries
        .route("/window/size", get(handlers::window_size))
        .route("/window/bounds-changed", post(handlers::bounds_changed))
        // Status observation
        .route("/status", get(handlers::status_snapshot))
        .route("/status/stream", get(handlers::status_stream))
        // Credentials
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        // UI surfaces live on extension origins
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
