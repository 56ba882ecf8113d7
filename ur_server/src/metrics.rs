//! Prometheus metrics for monitoring the game server.
//!
//! Metrics are exposed in Prometheus text format on their own listener when
//! `METRICS_BIND` is set. Without an installed exporter every call here is
//! a no-op.
//!
//! # Metrics Categories
//!
//! - **WebSocket Metrics**: Active connections, messages sent/received
//! - **Lobby Metrics**: Connected and available players
//! - **Game Metrics**: Matches started/finished, dice rolls, moves, captures
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ur_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::websocket_connections_active(10);
//! metrics::dice_rolls_total(3);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Set current active WebSocket connections count.
pub fn websocket_connections_active(count: usize) {
    metrics::gauge!("websocket_connections_active").set(count as f64);
}

/// Increment total WebSocket connections counter.
pub fn websocket_connections_total() {
    metrics::counter!("websocket_connections_total").increment(1);
}

/// Increment WebSocket messages sent counter.
pub fn websocket_messages_sent() {
    metrics::counter!("websocket_messages_sent").increment(1);
}

/// Increment WebSocket messages received counter.
pub fn websocket_messages_received() {
    metrics::counter!("websocket_messages_received").increment(1);
}

// ============================================================================
// Lobby Metrics
// ============================================================================

/// Set current count of players free to be challenged.
pub fn available_players(count: usize) {
    metrics::gauge!("available_players").set(count as f64);
}

// ============================================================================
// Game Metrics
// ============================================================================

/// Set current active matches count.
pub fn active_matches(count: usize) {
    metrics::gauge!("active_matches").set(count as f64);
}

/// Increment matches started counter.
pub fn matches_started_total() {
    metrics::counter!("matches_started_total").increment(1);
}

/// Increment matches finished counter, labelled by how the match ended.
pub fn matches_finished_total(outcome: &str) {
    metrics::counter!("matches_finished_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a dice roll.
pub fn dice_rolls_total(value: u8) {
    metrics::counter!("dice_rolls_total",
        "value" => value.to_string()
    )
    .increment(1);
}

/// Increment token moves counter.
pub fn moves_total() {
    metrics::counter!("moves_total").increment(1);
}

/// Increment captures counter.
pub fn captures_total() {
    metrics::counter!("captures_total").increment(1);
}
