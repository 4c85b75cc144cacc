//! Session registry - core session engine
//!
//! This module owns the mapping of session identifier to per-session light
//! counters, session identifier generation, and the inactivity markers used
//! by the reaper. All mutation goes through a single lock so concurrent
//! light transitions on the same session can never interleave their
//! decrement/increment halves.

mod ids;

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use thiserror::Error;

use crate::types::{Light, LightCounts, SessionInfo};

pub use ids::{generate_session_id, ID_ALPHABET, ID_LENGTH};

/// Errors surfaced by registry operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Session not found")]
    SessionNotFound,
}

/// Registry of live sessions and their counters
///
/// Constructed once at process start and shared behind an `Arc` through the
/// application state; never accessed as a global.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, LightCounts>>,
    /// Sessions whose counters reached zero, with the time it happened
    inactive: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            inactive: RwLock::new(HashMap::new()),
        }
    }

    /// Create a new session with zeroed counters and return its identifier
    ///
    /// The identifier is drawn from the fixed alphabet and re-drawn on
    /// collision, so this never fails; with 8 characters over a 34-symbol
    /// alphabet collisions are not expected to loop meaningfully.
    pub fn create(&self) -> String {
        let mut sessions = self.sessions.write();
        loop {
            let id = generate_session_id();
            if !sessions.contains_key(&id) {
                sessions.insert(id.clone(), LightCounts::new());
                return id;
            }
        }
    }

    /// Whether a session exists
    pub fn contains(&self, id: &str) -> bool {
        self.sessions.read().contains_key(id)
    }

    /// Snapshot of a session's counters
    pub fn counts(&self, id: &str) -> Option<LightCounts> {
        self.sessions.read().get(id).copied()
    }

    /// List sessions visible to the lobby: excludes inactive-marked
    /// sessions and sessions with no counted connections, sorted by user
    /// count descending.
    pub fn list_active(&self) -> Vec<SessionInfo> {
        let sessions = self.sessions.read();
        let inactive = self.inactive.read();

        let mut list: Vec<SessionInfo> = sessions
            .iter()
            .filter(|(id, _)| !inactive.contains_key(*id))
            .filter(|(_, counts)| counts.total() > 0)
            .map(|(id, counts)| SessionInfo {
                session_id: id.clone(),
                user_count: counts.total(),
            })
            .collect();

        list.sort_by(|a, b| b.user_count.cmp(&a.user_count));
        list
    }

    /// Adjust one counter by ±1
    pub fn adjust(&self, id: &str, light: Light, delta: i32) -> Result<(), RegistryError> {
        let mut sessions = self.sessions.write();
        let counts = sessions.get_mut(id).ok_or(RegistryError::SessionNotFound)?;
        if delta >= 0 {
            counts.add(light);
        } else {
            counts.sub(light);
        }
        Ok(())
    }

    /// Move one counted connection from one light to another
    ///
    /// Both halves happen under a single lock acquisition, so no reader or
    /// concurrent transition can observe the decrement without the
    /// increment.
    pub fn transfer(&self, id: &str, from: Light, to: Light) -> Result<(), RegistryError> {
        let mut sessions = self.sessions.write();
        let counts = sessions.get_mut(id).ok_or(RegistryError::SessionNotFound)?;
        counts.sub(from);
        counts.add(to);
        Ok(())
    }

    /// Remove a session; no-op if absent
    pub fn remove(&self, id: &str) {
        self.sessions.write().remove(id);
    }

    /// Number of live sessions (inactive-marked included)
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether the registry holds no sessions
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Record that a session's counters reached zero at `at`
    ///
    /// Keeps the earliest marker if one is already present.
    pub fn mark_inactive(&self, id: &str, at: DateTime<Utc>) {
        self.inactive.write().entry(id.to_string()).or_insert(at);
    }

    /// Clear a session's inactive marker, if any
    ///
    /// Called from the registration path so a session that regains a
    /// connection before expiry is never reaped.
    pub fn clear_inactive(&self, id: &str) {
        self.inactive.write().remove(id);
    }

    /// Whether a session currently carries an inactive marker
    pub fn is_inactive(&self, id: &str) -> bool {
        self.inactive.read().contains_key(id)
    }

    /// Session identifiers whose inactive marker is older than `grace`
    pub fn expired(&self, grace: Duration) -> Vec<String> {
        let now = Utc::now();
        self.inactive
            .read()
            .iter()
            .filter(|(_, marked_at)| now - **marked_at > grace)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Drop a session's inactive marker as part of its deletion
    pub fn remove_inactive(&self, id: &str) {
        self.inactive.write().remove(id);
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_inserts_zeroed_session() {
        let registry = SessionRegistry::new();
        let id = registry.create();

        assert!(registry.contains(&id));
        assert_eq!(registry.counts(&id), Some(LightCounts::new()));
    }

    #[test]
    fn test_create_yields_distinct_well_formed_ids() {
        let registry = SessionRegistry::new();
        let mut ids = std::collections::HashSet::new();

        for _ in 0..100 {
            let id = registry.create();
            assert_eq!(id.len(), ID_LENGTH);
            assert!(id.chars().all(|c| ID_ALPHABET.contains(c)));
            assert!(ids.insert(id), "duplicate session id generated");
        }
        assert_eq!(registry.len(), 100);
    }

    #[test]
    fn test_adjust_unknown_session() {
        let registry = SessionRegistry::new();
        assert_eq!(
            registry.adjust("missing", Light::Green, 1),
            Err(RegistryError::SessionNotFound)
        );
    }

    #[test]
    fn test_adjust_and_transfer() {
        let registry = SessionRegistry::new();
        let id = registry.create();

        registry.adjust(&id, Light::Green, 1).unwrap();
        registry.adjust(&id, Light::Green, 1).unwrap();
        assert_eq!(registry.counts(&id).unwrap().green, 2);

        registry.transfer(&id, Light::Green, Light::Red).unwrap();
        let counts = registry.counts(&id).unwrap();
        assert_eq!(counts.green, 1);
        assert_eq!(counts.red, 1);
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn test_remove_is_noop_when_absent() {
        let registry = SessionRegistry::new();
        registry.remove("missing");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_active_excludes_empty_and_inactive() {
        let registry = SessionRegistry::new();

        let empty = registry.create();
        let busy = registry.create();
        let idle = registry.create();

        registry.adjust(&busy, Light::Red, 1).unwrap();
        registry.adjust(&busy, Light::Green, 1).unwrap();
        registry.adjust(&idle, Light::Yellow, 1).unwrap();
        registry.mark_inactive(&idle, Utc::now());

        let list = registry.list_active();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].session_id, busy);
        assert_eq!(list[0].user_count, 2);
        assert!(!list.iter().any(|s| s.session_id == empty));
    }

    #[test]
    fn test_list_active_sorts_descending() {
        let registry = SessionRegistry::new();

        let small = registry.create();
        let large = registry.create();
        registry.adjust(&small, Light::Green, 1).unwrap();
        for _ in 0..3 {
            registry.adjust(&large, Light::Red, 1).unwrap();
        }

        let list = registry.list_active();
        assert_eq!(list[0].session_id, large);
        assert_eq!(list[1].session_id, small);
    }

    #[test]
    fn test_inactive_marker_lifecycle() {
        let registry = SessionRegistry::new();
        let id = registry.create();

        registry.mark_inactive(&id, Utc::now());
        assert!(registry.is_inactive(&id));

        registry.clear_inactive(&id);
        assert!(!registry.is_inactive(&id));
    }

    #[test]
    fn test_mark_inactive_keeps_earliest_timestamp() {
        let registry = SessionRegistry::new();
        let id = registry.create();

        let early = Utc::now() - Duration::hours(2);
        registry.mark_inactive(&id, early);
        registry.mark_inactive(&id, Utc::now());

        assert_eq!(registry.expired(Duration::hours(1)), vec![id]);
    }

    #[test]
    fn test_expired_respects_grace_period() {
        let registry = SessionRegistry::new();
        let old = registry.create();
        let fresh = registry.create();

        registry.mark_inactive(&old, Utc::now() - Duration::hours(2));
        registry.mark_inactive(&fresh, Utc::now() - Duration::minutes(5));

        let expired = registry.expired(Duration::hours(1));
        assert_eq!(expired, vec![old]);
    }
}
