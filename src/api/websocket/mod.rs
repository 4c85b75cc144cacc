//! WebSocket surface for live session membership
//!
//! Provides the `/ws/:session_id` endpoint: each connection joins a
//! session, claims a light slot, and receives a counter snapshot whenever
//! any member joins, leaves, or switches lights.

pub mod broadcast;
pub mod connections;
pub mod events;
pub mod handler;
pub mod state;

pub use broadcast::broadcast_update;
pub use connections::{ConnId, ConnectionTable};
pub use state::AppState;
