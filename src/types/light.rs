//! Light states and per-session counters

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the three mutually-exclusive light states a connection can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Light {
    Red,
    Yellow,
    Green,
}

impl Light {
    /// All light states, in wire order
    pub const ALL: [Light; 3] = [Light::Red, Light::Yellow, Light::Green];

    /// Wire name of the light
    pub fn as_str(&self) -> &'static str {
        match self {
            Light::Red => "red",
            Light::Yellow => "yellow",
            Light::Green => "green",
        }
    }
}

impl fmt::Display for Light {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Light {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "red" => Ok(Light::Red),
            "yellow" => Ok(Light::Yellow),
            "green" => Ok(Light::Green),
            _ => Err(()),
        }
    }
}

/// Per-session counters: how many connections currently hold each light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LightCounts {
    pub red: u32,
    pub yellow: u32,
    pub green: u32,
}

impl LightCounts {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for a single light
    pub fn get(&self, light: Light) -> u32 {
        match light {
            Light::Red => self.red,
            Light::Yellow => self.yellow,
            Light::Green => self.green,
        }
    }

    /// Increment one counter
    pub fn add(&mut self, light: Light) {
        *self.slot_mut(light) += 1;
    }

    /// Decrement one counter, saturating at zero
    ///
    /// The registry never decrements a slot that was not previously
    /// claimed, so hitting zero here indicates a bookkeeping bug upstream.
    pub fn sub(&mut self, light: Light) {
        let slot = self.slot_mut(light);
        if *slot == 0 {
            tracing::warn!(light = %light, "decrement of zero counter ignored");
            return;
        }
        *slot -= 1;
    }

    /// Total number of counted connections in the session
    pub fn total(&self) -> u32 {
        self.red + self.yellow + self.green
    }

    fn slot_mut(&mut self, light: Light) -> &mut u32 {
        match light {
            Light::Red => &mut self.red,
            Light::Yellow => &mut self.yellow,
            Light::Green => &mut self.green,
        }
    }
}
