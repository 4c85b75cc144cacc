//! Server configuration from environment variables

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Runtime configuration, loaded once at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: IpAddr,
    /// Bind port
    pub port: u16,
    /// How often the reaper scans for expired sessions
    pub reap_interval: Duration,
    /// How long a zero-count session survives before eviction
    pub inactive_grace: Duration,
}

impl ServerConfig {
    pub const DEFAULT_PORT: u16 = 8000;
    pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(600);
    pub const DEFAULT_INACTIVE_GRACE: Duration = Duration::from_secs(3600);

    /// Read configuration from the environment, falling back to defaults
    /// on unset or unparseable values.
    ///
    /// Variables: `HOST`, `PORT`, `REAP_INTERVAL_SECS`,
    /// `INACTIVE_GRACE_SECS`.
    pub fn from_env() -> Self {
        Self {
            host: parse_env("HOST").unwrap_or_else(|| IpAddr::from([0, 0, 0, 0])),
            port: parse_env("PORT").unwrap_or(Self::DEFAULT_PORT),
            reap_interval: parse_env("REAP_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(Self::DEFAULT_REAP_INTERVAL),
            inactive_grace: parse_env("INACTIVE_GRACE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(Self::DEFAULT_INACTIVE_GRACE),
        }
    }

    /// Socket address to bind the listener on
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: Self::DEFAULT_PORT,
            reap_interval: Self::DEFAULT_REAP_INTERVAL,
            inactive_grace: Self::DEFAULT_INACTIVE_GRACE,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.parse().ok())
}
