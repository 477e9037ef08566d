use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::server::handlers::{chat, health};
use crate::server::AppState;

/// Routes, permissive CORS for the browser frontend, and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health::health))
        .route("/health", get(health::health))
        .route("/chat", post(chat::chat))
        .route("/chat/debug", post(chat::chat_debug))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
