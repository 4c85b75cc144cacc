//! Session payload types

use serde::{Deserialize, Serialize};

use super::LightCounts;

/// Snapshot of a session's counters as sent to clients
///
/// Serializes as `{"lights": {"red": N, "yellow": N, "green": N}}`, the
/// shape used both by `GET /session/:id` and the WebSocket update frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub lights: LightCounts,
}

impl SessionSnapshot {
    pub fn new(lights: LightCounts) -> Self {
        Self { lights }
    }
}

/// One entry in the active-session listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub user_count: u32,
}
