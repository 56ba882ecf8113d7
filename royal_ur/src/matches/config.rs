//! Match configuration.

use serde::{Deserialize, Serialize};
use tokio::time::Duration;

/// Per-match runtime settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Milliseconds a player may stall before their turn passes (0 = never)
    pub turn_timeout_ms: u64,

    /// Interval between actor ticks in milliseconds
    pub tick_interval_ms: u64,

    /// Capacity of each actor's message inbox
    pub inbox_capacity: usize,

    /// Fixed dice seed, for reproducible matches
    pub rng_seed: Option<u64>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            turn_timeout_ms: 0,
            tick_interval_ms: 1000,
            inbox_capacity: 100,
            rng_seed: None,
        }
    }
}

impl MatchConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval_ms == 0 {
            return Err("Tick interval must be greater than zero".to_string());
        }

        if self.inbox_capacity == 0 {
            return Err("Inbox capacity must be greater than zero".to_string());
        }

        if self.turn_timeout_ms != 0 && self.turn_timeout_ms < self.tick_interval_ms {
            return Err("Turn timeout must not be shorter than the tick interval".to_string());
        }

        Ok(())
    }

    /// Get the turn timeout, if one is configured
    pub fn turn_timeout(&self) -> Option<Duration> {
        (self.turn_timeout_ms > 0).then(|| Duration::from_millis(self.turn_timeout_ms))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
