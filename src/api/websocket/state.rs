//! Shared application state

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::connections::{ConnId, ConnectionTable};
use crate::session::SessionRegistry;

/// State shared by every handler and the reaper
///
/// Constructed once in `main` and passed to the router as `Arc<AppState>`;
/// nothing here is reachable as a global.
pub struct AppState {
    /// Session counters and inactivity markers
    pub registry: SessionRegistry,

    /// Live WebSocket connections per session
    pub connections: ConnectionTable,

    /// Last time any client showed signs of life (HTTP or WS heartbeat,
    /// or a new WebSocket connection)
    last_activity: RwLock<DateTime<Utc>>,

    /// Allocator for process-unique connection ids
    next_conn_id: AtomicU64,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            registry: SessionRegistry::new(),
            connections: ConnectionTable::new(),
            last_activity: RwLock::new(Utc::now()),
            next_conn_id: AtomicU64::new(0),
        }
    }

    /// Allocate an identifier for a new connection
    pub fn next_conn_id(&self) -> ConnId {
        self.next_conn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Record client activity now
    pub fn touch_activity(&self) {
        *self.last_activity.write() = Utc::now();
    }

    /// Timestamp of the most recent client activity
    pub fn last_activity(&self) -> DateTime<Utc> {
        *self.last_activity.read()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
