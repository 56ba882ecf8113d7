//! HTTP/WebSocket API for the game server.
//!
//! Players connect over a WebSocket, land in the lobby, challenge each
//! other, and play their matches over the same connection. A few read-only
//! REST endpoints expose the lobby and running games.
//!
//! # Modules
//!
//! - [`games`]: Read-only player and game listings
//! - [`websocket`]: Per-connection handler relaying lobby requests and game
//!   actions, and pushing game snapshots back
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                 - Server health status
//! GET  /api/v1/players         - Connected players
//! GET  /api/v1/games           - Running games
//! GET  /api/v1/games/{id}      - Snapshot of one game
//! GET  /ws?name=<name>         - WebSocket connection
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use royal_ur::MatchConfig;
//! use ur_server::api::{AppState, create_router};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState::new(MatchConfig::default());
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod games;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use royal_ur::{
    Lobby, MatchConfig, MatchManager, entities::PlayerId, messages::ServerMessage,
};
use serde_json::json;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{RwLock, mpsc};
use tower_http::cors::CorsLayer;

use crate::metrics;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// This state is cloned for each request (cheap due to Arc wrappers).
#[derive(Clone)]
pub struct AppState {
    /// Connected players and pending challenges
    pub lobby: Arc<RwLock<Lobby>>,
    /// Registry of running match actors
    pub match_manager: Arc<MatchManager>,
    /// Outgoing message queue of every open connection
    pub connections: Arc<RwLock<HashMap<PlayerId, mpsc::Sender<ServerMessage>>>>,
}

impl AppState {
    pub fn new(match_config: MatchConfig) -> Self {
        Self {
            lobby: Arc::new(RwLock::new(Lobby::new())),
            match_manager: Arc::new(MatchManager::new(match_config)),
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Outgoing queue of a connected player
    pub async fn connection(&self, player_id: &PlayerId) -> Option<mpsc::Sender<ServerMessage>> {
        let connections = self.connections.read().await;
        connections.get(player_id).cloned()
    }

    /// Queue a message for one player. Returns false if they're gone.
    pub async fn send_to(&self, player_id: &PlayerId, message: ServerMessage) -> bool {
        match self.connection(player_id).await {
            Some(sender) => sender.send(message).await.is_ok(),
            None => false,
        }
    }

    /// Push the list of available players to every connection
    ///
    /// Connections whose queue is full skip this round; the next broadcast
    /// carries the same information.
    pub async fn broadcast_connected_players(&self) {
        let players = self.lobby.read().await.available_players();
        metrics::available_players(players.len());

        let message = ServerMessage::ConnectedPlayers { players };
        let senders: Vec<_> = self.connections.read().await.values().cloned().collect();
        for sender in senders {
            let _ = sender.try_send(message.clone());
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/players", get(games::list_players))
        .route("/games", get(games::list_games))
        .route("/games/{game_id}", get(games::get_game));

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .nest("/api/v1", v1_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:3000/health
/// # {"status":"healthy","version":"0.1.0","players":2,"matches":1,"timestamp":"2026-10-18T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let players = state.lobby.read().await.len();
    let matches = state.match_manager.active_match_count().await;

    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "players": players,
        "matches": matches,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(response))
}
