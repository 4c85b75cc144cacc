//! Traffic Light session server
//!
//! A real-time session broadcaster: clients join a shared named session
//! over a WebSocket, pick one of three lights (red, yellow, green), and
//! every member sees live aggregate counts of who holds which light.
//!
//! # Features
//!
//! - **Short session ids**: 8 characters, ambiguity-free alphabet,
//!   collision-checked at creation
//! - **Live counters**: every join, leave, and light change is broadcast
//!   to the whole session
//! - **Thread-safe**: one lock around the counters, so concurrent light
//!   changes never interleave
//! - **Self-cleaning**: sessions that sit empty past a grace period are
//!   evicted by a background reaper
//!
//! # Modules
//!
//! - `types`: core data structures (`Light`, `LightCounts`, payloads)
//! - `session`: the session registry with counters and inactivity markers
//! - `api`: Axum router, REST handlers, and the WebSocket surface
//! - `reaper`: background eviction of abandoned sessions
//! - `config`: environment-based server configuration

pub mod api;
pub mod config;
pub mod reaper;
pub mod session;
pub mod types;

// Re-export commonly used items at crate root
pub use api::http::create_router;
pub use api::websocket::{AppState, ConnectionTable};
pub use config::ServerConfig;
pub use session::{RegistryError, SessionRegistry};
pub use types::{Light, LightCounts, SessionInfo, SessionSnapshot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
