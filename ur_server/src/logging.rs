//! Structured logging configuration.
//!
//! The library crate logs through the `log` facade; those records are
//! picked up by the same subscriber as the server's own `tracing` events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the RUST_LOG env var and default to
/// `info`.
///
/// # Example
///
/// ```no_run
/// use ur_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,tower_http=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a game lifecycle event with structured data
///
/// # Example
///
/// ```
/// use ur_server::logging::log_game_event;
///
/// log_game_event("started", "6a1d3c3e-8f0b-4c1e-9d4b-3f2a1b0c9d8e", "alice vs bob");
/// ```
pub fn log_game_event(event_type: &str, game_id: &str, message: &str) {
    tracing::info!(
        event_type = event_type,
        game_id = game_id,
        "GAME: {}",
        message
    );
}

/// Log a player connecting or disconnecting
pub fn log_connection(player_id: &str, name: &str, connected: bool) {
    if connected {
        tracing::info!(player_id = player_id, name = name, "{} has joined", name);
    } else {
        tracing::info!(player_id = player_id, name = name, "{} has left", name);
    }
}

/// Log a client request the server dropped
pub fn log_rejected_request(player_id: &str, request: &str, reason: &str) {
    tracing::debug!(
        player_id = player_id,
        request = request,
        reason = reason,
        "Request ignored"
    );
}
