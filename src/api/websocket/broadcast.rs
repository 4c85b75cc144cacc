//! Counter snapshot fan-out
//!
//! Serializes a session's current counters once and pushes the frame to
//! every live connection in the session. Delivery is best-effort per
//! handle: a failed send means the connection's writer task is gone, so
//! the handle is pruned and the loop moves on. Counter cleanup stays with
//! the connection handler's termination path; pruning here is only a
//! safety net against sockets that died without unwinding yet.

use axum::extract::ws::Message;
use tracing::debug;

use super::connections::ConnectionTable;
use super::events::ServerMessage;
use crate::session::SessionRegistry;
use crate::types::SessionSnapshot;

/// Broadcast the current counters of `session_id` to all of its members
pub fn broadcast_update(registry: &SessionRegistry, table: &ConnectionTable, session_id: &str) {
    let Some(counts) = registry.counts(session_id) else {
        // Session deleted under us (reaper); nothing to send.
        return;
    };

    let msg = ServerMessage::update(SessionSnapshot::new(counts));
    let json = match serde_json::to_string(&msg) {
        Ok(json) => json,
        Err(e) => {
            debug!(session_id, error = %e, "failed to serialize update");
            return;
        }
    };

    let senders = table.senders(session_id);
    let mut delivered = 0usize;
    for (conn_id, tx) in senders {
        // Unbounded queue: send never blocks, it only fails when the
        // receiving writer task has exited.
        if tx.send(Message::Text(json.clone())).is_ok() {
            delivered += 1;
        } else {
            debug!(session_id, conn_id, "pruning unreachable connection");
            table.remove(session_id, conn_id);
        }
    }
    debug!(session_id, delivered, "broadcast update");
}
