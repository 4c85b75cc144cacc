//! REST endpoints for session management
//!
//! Everything here is thin CRUD over the session registry:
//! - `POST /create-session` - create a session, return its id and URL
//! - `GET /session/:id` - counter snapshot for one session
//! - `GET /list-sessions` - active sessions sorted by user count
//! - `GET /heartbeat` - process keepalive for hosting platforms

pub mod sessions;

use serde::Serialize;

/// Error body returned to clients, e.g. `{"error": "Session not found"}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
