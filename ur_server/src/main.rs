//! Royal Game of Ur server using an async actor per match.

use std::{net::SocketAddr, time::Duration};

use anyhow::Error;
use log::{error, info};
use pico_args::Arguments;
use ur_server::{
    api::{self, AppState},
    config::ServerConfig,
    logging, metrics,
};

const HELP: &str = "\
Run a Royal Game of Ur server

USAGE:
  ur_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:3000]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                  Server bind address (e.g., 0.0.0.0:8080)
  TURN_TIMEOUT_SECS            Pass the turn after this many idle seconds [default: 0, off]
  MATCH_TICK_INTERVAL_MS       How often matches check the turn timeout   [default: 1000]
  MATCH_INBOX_CAPACITY         Queued requests per match                  [default: 100]
  LOBBY_BROADCAST_INTERVAL_MS  How often the player list is pushed        [default: 1000]
  METRICS_BIND                 Prometheus exporter address                [default: off]
  RUST_LOG                     Log filter                                 [default: info]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;

    logging::init();

    let config = ServerConfig::from_env(bind)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics exposed at http://{}/metrics", addr);
    }

    match config.matches.turn_timeout() {
        Some(timeout) => info!("Turn timeout: {}s", timeout.as_secs()),
        None => info!("Turn timeout disabled"),
    }

    let state = AppState::new(config.matches.clone());

    // Push the available players to every client at a fixed pace
    let broadcast_state = state.clone();
    let broadcast_interval = Duration::from_millis(config.lobby_broadcast_interval_ms);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(broadcast_interval);
        loop {
            ticker.tick().await;
            broadcast_state.broadcast_connected_players().await;
            metrics::active_matches(broadcast_state.match_manager.active_match_count().await);
        }
    });

    let app = api::create_router(state);

    info!("Starting HTTP/WebSocket server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
    }
}
