//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use super::rest::sessions;
use super::websocket::{handler::ws_handler, state::AppState};

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration - the service is meant to sit behind arbitrary
    // static-hosted frontends, so origins stay open.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(sessions::root))
        // Session CRUD
        .route("/create-session", post(sessions::create_session))
        .route("/session/:session_id", get(sessions::get_session))
        .route("/list-sessions", get(sessions::list_sessions))
        .route("/heartbeat", get(sessions::heartbeat))
        // WebSocket endpoint
        .route("/ws/:session_id", get(ws_handler))
        .layer(cors)
        .with_state(state)
}
