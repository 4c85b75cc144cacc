//! Background eviction of abandoned sessions
//!
//! A session whose counters hit zero picks up an inactive marker; once the
//! marker is older than the grace period the session and its connection
//! entries are deleted. A session that regains a connection first has its
//! marker cleared by the registration path and is never touched here.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::api::websocket::state::AppState;

/// Run the reaper loop; cancelled only at process shutdown
pub async fn run(state: Arc<AppState>, interval: Duration, grace: Duration) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick fires immediately; skip it so startup doesn't sweep.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let reaped = sweep(&state, grace);
        debug!(reaped, "reaper pass finished");
    }
}

/// Delete every session whose inactive marker is older than `grace`
///
/// Returns the number of sessions removed. Kept as a plain function so
/// tests can drive a sweep without the timer.
pub fn sweep(state: &AppState, grace: Duration) -> usize {
    let grace = match chrono::Duration::from_std(grace) {
        Ok(grace) => grace,
        Err(e) => {
            // An out-of-range grace period disables eviction for this
            // pass; the loop keeps its schedule.
            tracing::error!(error = %e, "invalid grace period, skipping sweep");
            return 0;
        }
    };

    let expired = state.registry.expired(grace);
    for session_id in &expired {
        state.registry.remove(session_id);
        state.connections.remove_session(session_id);
        state.registry.remove_inactive(session_id);
        info!(%session_id, "cleaned up inactive session");
    }
    expired.len()
}
