//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use royal_ur::MatchConfig;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    str::FromStr,
};

/// Default bind address when neither `--bind` nor `SERVER_BIND` is given
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000);

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// How often the available players list is pushed to every client
    pub lobby_broadcast_interval_ms: u64,
    /// Prometheus exporter address; metrics are off when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Settings handed to every match actor
    pub matches: MatchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND,
            lobby_broadcast_interval_ms: 1000,
            metrics_bind: None,
            matches: MatchConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but can't be parsed
    pub fn from_env(bind_override: Option<SocketAddr>) -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok(), bind_override)
    }

    /// Load configuration through `lookup` instead of the process environment
    pub fn from_vars<F>(lookup: F, bind_override: Option<SocketAddr>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_var(&lookup, "SERVER_BIND")?.unwrap_or(defaults.bind),
        };

        let turn_timeout_secs: u64 = parse_var(&lookup, "TURN_TIMEOUT_SECS")?.unwrap_or(0);

        let matches = MatchConfig {
            turn_timeout_ms: turn_timeout_secs.saturating_mul(1000),
            tick_interval_ms: parse_var(&lookup, "MATCH_TICK_INTERVAL_MS")?
                .unwrap_or(defaults.matches.tick_interval_ms),
            inbox_capacity: parse_var(&lookup, "MATCH_INBOX_CAPACITY")?
                .unwrap_or(defaults.matches.inbox_capacity),
            rng_seed: None,
        };

        Ok(ServerConfig {
            bind,
            lobby_broadcast_interval_ms: parse_var(&lookup, "LOBBY_BROADCAST_INTERVAL_MS")?
                .unwrap_or(defaults.lobby_broadcast_interval_ms),
            metrics_bind: parse_var(&lookup, "METRICS_BIND")?,
            matches,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lobby_broadcast_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "LOBBY_BROADCAST_INTERVAL_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.matches.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "MATCH_TICK_INTERVAL_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.matches.inbox_capacity == 0 {
            return Err(ConfigError::Invalid {
                var: "MATCH_INBOX_CAPACITY".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if let Some(metrics_bind) = self.metrics_bind
            && metrics_bind == self.bind
        {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        self.matches
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                var: "TURN_TIMEOUT_SECS".to_string(),
                reason,
            })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse an optional variable, rejecting values that don't parse
fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("{value:?}: {e}"),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_vars(vars(&[]), None).unwrap();
        assert_eq!(config.bind, DEFAULT_BIND);
        assert_eq!(config.lobby_broadcast_interval_ms, 1000);
        assert_eq!(config.metrics_bind, None);
        assert_eq!(config.matches, MatchConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reads_variables() {
        let config = ServerConfig::from_vars(
            vars(&[
                ("SERVER_BIND", "0.0.0.0:8080"),
                ("LOBBY_BROADCAST_INTERVAL_MS", "250"),
                ("TURN_TIMEOUT_SECS", "30"),
                ("MATCH_TICK_INTERVAL_MS", "500"),
                ("MATCH_INBOX_CAPACITY", "16"),
                ("METRICS_BIND", "0.0.0.0:9090"),
            ]),
            None,
        )
        .unwrap();

        assert_eq!(config.bind, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.lobby_broadcast_interval_ms, 250);
        assert_eq!(config.matches.turn_timeout_ms, 30_000);
        assert_eq!(config.matches.tick_interval_ms, 500);
        assert_eq!(config.matches.inbox_capacity, 16);
        assert_eq!(config.metrics_bind, Some("0.0.0.0:9090".parse().unwrap()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bind_override_wins() {
        let config = ServerConfig::from_vars(
            vars(&[("SERVER_BIND", "0.0.0.0:8080")]),
            Some("127.0.0.1:4000".parse().unwrap()),
        )
        .unwrap();
        assert_eq!(config.bind, "127.0.0.1:4000".parse().unwrap());
    }

    #[test]
    fn test_unparsable_value_rejected() {
        let err = ServerConfig::from_vars(vars(&[("TURN_TIMEOUT_SECS", "soon")]), None)
            .unwrap_err();
        assert!(err.to_string().contains("TURN_TIMEOUT_SECS"));

        let err = ServerConfig::from_vars(vars(&[("SERVER_BIND", "nowhere")]), None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "SERVER_BIND"));
    }

    #[test]
    fn test_blank_value_uses_default() {
        let config =
            ServerConfig::from_vars(vars(&[("METRICS_BIND", "  ")]), None).unwrap();
        assert_eq!(config.metrics_bind, None);
    }

    #[test]
    fn test_config_validation_zero_interval() {
        let config = ServerConfig {
            lobby_broadcast_interval_ms: 0,
            ..ServerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_config_validation_zero_inbox() {
        let mut config = ServerConfig::default();
        config.matches.inbox_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_metrics_on_server_port() {
        let config = ServerConfig {
            metrics_bind: Some(ServerConfig::default().bind),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
