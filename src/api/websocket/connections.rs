//! Connection table - live WebSocket handles per session
//!
//! Each connection is keyed by a process-unique numeric id and carries its
//! outbound queue plus the per-connection bookkeeping the state machine
//! needs: which light slot it occupies and whether it has been counted.
//! Keeping this record here rather than on the socket avoids depending on
//! handle identity semantics.

use std::collections::HashMap;

use axum::extract::ws::Message;
use parking_lot::RwLock;
use tokio::sync::mpsc::UnboundedSender;

use crate::types::Light;

/// Process-unique connection identifier
pub type ConnId = u64;

/// Outbound queue handle for one connection
pub type ConnSender = UnboundedSender<Message>;

/// Per-connection bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnMeta {
    /// Whether this connection currently contributes to the counters
    pub counted: bool,
    /// The light slot it occupies, if any
    pub slot: Option<Light>,
}

struct ConnEntry {
    tx: ConnSender,
    meta: ConnMeta,
}

/// Table of live connections, grouped by session
pub struct ConnectionTable {
    inner: RwLock<HashMap<String, HashMap<ConnId, ConnEntry>>>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Add a connection to a session, uncounted and slotless
    ///
    /// Returns `true` if this is the first appearance of this connection
    /// id in the session. A connection that somehow registers twice keeps
    /// its existing entry and must not be counted again.
    pub fn register(&self, session_id: &str, conn_id: ConnId, tx: ConnSender) -> bool {
        let mut table = self.inner.write();
        let conns = table.entry(session_id.to_string()).or_default();
        match conns.entry(conn_id) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(ConnEntry {
                    tx,
                    meta: ConnMeta {
                        counted: false,
                        slot: None,
                    },
                });
                true
            }
        }
    }

    /// Remove a connection, returning its final bookkeeping for cleanup
    ///
    /// No-op (returns `None`) if the connection is not present.
    pub fn remove(&self, session_id: &str, conn_id: ConnId) -> Option<ConnMeta> {
        let mut table = self.inner.write();
        let conns = table.get_mut(session_id)?;
        let entry = conns.remove(&conn_id)?;
        Some(entry.meta)
    }

    /// Record which light slot a connection occupies
    pub fn set_slot(&self, session_id: &str, conn_id: ConnId, light: Light) {
        let mut table = self.inner.write();
        if let Some(entry) = table.get_mut(session_id).and_then(|c| c.get_mut(&conn_id)) {
            entry.meta.slot = Some(light);
        }
    }

    /// Mark a connection as counted in its session's counters
    pub fn mark_counted(&self, session_id: &str, conn_id: ConnId) {
        let mut table = self.inner.write();
        if let Some(entry) = table.get_mut(session_id).and_then(|c| c.get_mut(&conn_id)) {
            entry.meta.counted = true;
        }
    }

    /// Bookkeeping snapshot for one connection
    pub fn meta(&self, session_id: &str, conn_id: ConnId) -> Option<ConnMeta> {
        let table = self.inner.read();
        table
            .get(session_id)
            .and_then(|c| c.get(&conn_id))
            .map(|entry| entry.meta)
    }

    /// Snapshot of the live senders in a session for broadcast iteration
    ///
    /// Cloned out under the read lock so delivery happens without holding
    /// the table against concurrent registration.
    pub fn senders(&self, session_id: &str) -> Vec<(ConnId, ConnSender)> {
        let table = self.inner.read();
        table
            .get(session_id)
            .map(|conns| {
                conns
                    .iter()
                    .map(|(id, entry)| (*id, entry.tx.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of live connections in a session
    pub fn session_len(&self, session_id: &str) -> usize {
        let table = self.inner.read();
        table.get(session_id).map(|c| c.len()).unwrap_or(0)
    }

    /// Drop every connection entry for a session
    pub fn remove_session(&self, session_id: &str) {
        self.inner.write().remove(session_id);
    }
}

impl Default for ConnectionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn make_sender() -> (ConnSender, mpsc::UnboundedReceiver<Message>) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn test_register_first_appearance() {
        let table = ConnectionTable::new();
        let (tx, _rx) = make_sender();

        assert!(table.register("sess", 1, tx.clone()));
        assert!(!table.register("sess", 1, tx));
        assert_eq!(table.session_len("sess"), 1);
    }

    #[test]
    fn test_register_initializes_uncounted() {
        let table = ConnectionTable::new();
        let (tx, _rx) = make_sender();
        table.register("sess", 1, tx);

        let meta = table.meta("sess", 1).unwrap();
        assert!(!meta.counted);
        assert_eq!(meta.slot, None);
    }

    #[test]
    fn test_slot_and_counted_updates() {
        let table = ConnectionTable::new();
        let (tx, _rx) = make_sender();
        table.register("sess", 1, tx);

        table.set_slot("sess", 1, Light::Green);
        table.mark_counted("sess", 1);

        let meta = table.meta("sess", 1).unwrap();
        assert!(meta.counted);
        assert_eq!(meta.slot, Some(Light::Green));
    }

    #[test]
    fn test_remove_returns_final_meta() {
        let table = ConnectionTable::new();
        let (tx, _rx) = make_sender();
        table.register("sess", 1, tx);
        table.set_slot("sess", 1, Light::Red);
        table.mark_counted("sess", 1);

        let meta = table.remove("sess", 1).unwrap();
        assert!(meta.counted);
        assert_eq!(meta.slot, Some(Light::Red));

        assert!(table.remove("sess", 1).is_none());
        assert_eq!(table.session_len("sess"), 0);
    }

    #[test]
    fn test_senders_snapshot() {
        let table = ConnectionTable::new();
        let (tx1, _rx1) = make_sender();
        let (tx2, _rx2) = make_sender();
        table.register("sess", 1, tx1);
        table.register("sess", 2, tx2);
        table.register("other", 3, make_sender().0);

        let mut ids: Vec<ConnId> = table.senders("sess").into_iter().map(|(id, _)| id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
        assert!(table.senders("missing").is_empty());
    }

    #[test]
    fn test_remove_session_drops_all() {
        let table = ConnectionTable::new();
        table.register("sess", 1, make_sender().0);
        table.register("sess", 2, make_sender().0);

        table.remove_session("sess");
        assert_eq!(table.session_len("sess"), 0);
    }
}
