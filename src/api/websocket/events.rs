//! WebSocket wire messages
//!
//! Inbound frames are textual JSON with a `type` tag; anything that fails
//! to parse is dropped without closing the connection.

use serde::{Deserialize, Serialize};

use crate::types::SessionSnapshot;

/// Messages clients send to the server
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Request to move this connection to a different light
    ///
    /// The light name is validated separately so an unknown name is an
    /// ignored message rather than a parse failure with its own path.
    SelectLight { light: String },

    /// Keepalive; answered with a unicast ack, never broadcast
    Heartbeat,
}

/// Messages the server sends to clients
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Counter snapshot broadcast to every member of a session
    Update { data: SessionSnapshot },

    /// Reply to a client heartbeat, sent only to the sender
    HeartbeatAck { timestamp: i64 },
}

impl ServerMessage {
    /// Build an update frame from a counters snapshot
    pub fn update(snapshot: SessionSnapshot) -> Self {
        ServerMessage::Update { data: snapshot }
    }

    /// Build a heartbeat ack stamped with the current time
    pub fn heartbeat_ack() -> Self {
        ServerMessage::HeartbeatAck {
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}
