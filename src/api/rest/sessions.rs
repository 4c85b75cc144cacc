//! Session CRUD handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use super::ErrorBody;
use crate::api::websocket::state::AppState;
use crate::types::{SessionInfo, SessionSnapshot};

/// Response for `POST /create-session`
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub url: String,
}

/// Response for `GET /list-sessions`
#[derive(Debug, Serialize)]
pub struct ListSessionsResponse {
    pub sessions: Vec<SessionInfo>,
}

/// GET / - service banner
pub async fn root() -> impl IntoResponse {
    Json(json!({"message": "Traffic Light API"}))
}

/// POST /create-session - create an empty session
pub async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session_id = state.registry.create();
    info!(%session_id, "session created");

    let url = format!("/traffic-light/{session_id}");
    Json(CreateSessionResponse { session_id, url })
}

/// GET /session/:id - counter snapshot for one session
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Response {
    match state.registry.counts(&session_id) {
        Some(counts) => Json(SessionSnapshot::new(counts)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody::new("Session not found")),
        )
            .into_response(),
    }
}

/// GET /list-sessions - active sessions, busiest first
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ListSessionsResponse {
        sessions: state.registry.list_active(),
    })
}

/// GET /heartbeat - keepalive used by clients to hold the process warm
pub async fn heartbeat(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.touch_activity();
    Json(json!({
        "status": "alive",
        "last_activity": state.last_activity().to_rfc3339(),
    }))
}
