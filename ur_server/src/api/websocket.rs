//! WebSocket handler for the lobby and live games.
//!
//! Every connection is a player. Lobby requests and game actions arrive as
//! JSON text frames and game snapshots are pushed back after every change.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws?name=<name>`
//! 2. Server assigns a player id, adds the player to the lobby and sends
//!    `welcome`
//! 3. Server spawns a send task draining the connection's outgoing queue
//! 4. Incoming frames are applied one by one until the socket closes
//! 5. On disconnect the player leaves the lobby and any game they were in
//!    is abandoned, with `opponent_left` sent to the other side
//!
//! Requests that break the rules (acting out of turn, accepting a challenge
//! that doesn't exist, challenging yourself) are dropped without a reply.
//! Only frames that can't be parsed get an `error` back.
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:3000/ws?name=alice');
//!
//! ws.onmessage = (event) => {
//!   const data = JSON.parse(event.data);
//!   if (data.type === 'game_update') {
//!     renderBoard(data.game);
//!   }
//! };
//!
//! ws.send(JSON.stringify({ type: 'roll', game_id: gameId }));
//! ```

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use log::{error, info, warn};
use royal_ur::{
    MatchUpdate,
    entities::{GameId, Lane, PlayerId, PlayerName},
    matches::MatchResponse,
    messages::{ClientMessage, ServerMessage},
};
use serde::Deserialize;
use tokio::sync::mpsc;

use super::AppState;
use crate::{logging, metrics};

/// Outgoing queue depth per connection
const OUTBOX_CAPACITY: usize = 64;

/// Snapshot queue depth per player per match
const UPDATE_CAPACITY: usize = 32;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    name: Option<String>,
}

/// Upgrade HTTP connection to WebSocket.
///
/// # Query Parameters
///
/// - `name`: Optional display name; defaults to the assigned player id
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let name = PlayerName::new(query.name.as_deref().unwrap_or_default());
    ws.on_upgrade(move |socket| handle_socket(socket, name, state))
}

/// Handle an established WebSocket connection.
async fn handle_socket(socket: WebSocket, name: PlayerName, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let player_id = PlayerId::generate();

    let name = {
        let mut lobby = state.lobby.write().await;
        if let Err(e) = lobby.join(player_id, name) {
            error!("Player {} could not join the lobby: {}", player_id, e);
            return;
        }
        lobby.name_of(&player_id).cloned().unwrap_or_default()
    };

    let (outbox_tx, mut outbox_rx) = mpsc::channel::<ServerMessage>(OUTBOX_CAPACITY);
    let connection_count = {
        let mut connections = state.connections.write().await;
        connections.insert(player_id, outbox_tx.clone());
        connections.len()
    };

    logging::log_connection(&player_id.to_string(), name.as_str(), true);
    metrics::websocket_connections_total();
    metrics::websocket_connections_active(connection_count);

    let _ = outbox_tx
        .send(ServerMessage::Welcome {
            player_id,
            name: name.clone(),
        })
        .await;

    // Spawn task draining the outgoing queue into the socket
    let send_task = tokio::spawn(async move {
        while let Some(message) = outbox_rx.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(j) => j,
                Err(e) => {
                    error!("Failed to serialize {}: {}", message, e);
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
            metrics::websocket_messages_sent();
        }
    });

    // Receive messages from client
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                metrics::websocket_messages_received();

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => {
                        info!("{} {}", player_id, client_msg);
                        handle_client_message(client_msg, player_id, &state).await;
                    }
                    Err(e) => {
                        warn!("Failed to parse message from {}: {}", player_id, e);
                        let _ = outbox_tx
                            .send(ServerMessage::Error {
                                message: "Invalid message format".to_string(),
                            })
                            .await;
                    }
                }
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket closed: player={}", player_id);
                break;
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    disconnect(player_id, &state).await;
    send_task.abort();

    info!("WebSocket disconnected: player={}", player_id);
}

/// Apply one client request.
async fn handle_client_message(msg: ClientMessage, player_id: PlayerId, state: &AppState) {
    match msg {
        ClientMessage::NameChange { name } => {
            if let Err(e) = state.lobby.write().await.rename(&player_id, name) {
                reject(player_id, "name_change", e);
            }
        }

        ClientMessage::ChallengePlayer { player_id: opponent } => {
            let player_name = {
                let mut lobby = state.lobby.write().await;
                if let Err(e) = lobby.challenge(&player_id, &opponent) {
                    reject(player_id, "challenge_player", e);
                    return;
                }
                lobby.name_of(&player_id).cloned().unwrap_or_default()
            };

            state
                .send_to(
                    &opponent,
                    ServerMessage::IncomingChallenge {
                        player_id,
                        player_name,
                    },
                )
                .await;
        }

        ClientMessage::ChallengeAccept {
            player_id: challenger,
        } => accept_challenge(player_id, challenger, state).await,

        ClientMessage::ChallengeReject {
            player_id: challenger,
        } => {
            let player_name = {
                let mut lobby = state.lobby.write().await;
                if let Err(e) = lobby.reject(&player_id, &challenger) {
                    reject(player_id, "challenge_reject", e);
                    return;
                }
                lobby.name_of(&player_id).cloned().unwrap_or_default()
            };

            state
                .send_to(
                    &challenger,
                    ServerMessage::ChallengeRejected {
                        player_id,
                        player_name,
                    },
                )
                .await;
        }

        ClientMessage::Roll { game_id } => {
            match state.match_manager.roll(game_id, player_id).await {
                Ok(MatchResponse::Rolled(outcome)) => metrics::dice_rolls_total(outcome.value()),
                Ok(MatchResponse::Rejected(e)) => reject(player_id, "roll", e),
                Ok(_) => {}
                Err(e) => reject(player_id, "roll", e),
            }
        }

        ClientMessage::GameMove {
            game_id,
            track,
            lane,
        } => make_move(player_id, game_id, track, lane, state).await,
    }
}

/// Start a game between `challenger` (player 1) and `accepter` (player 2).
async fn accept_challenge(accepter: PlayerId, challenger: PlayerId, state: &AppState) {
    // The lobby stays locked until both players are marked as playing, so
    // neither can be pulled into a second game meanwhile.
    let mut lobby = state.lobby.write().await;
    if let Err(e) = lobby.accept(&accepter, &challenger) {
        reject(accepter, "challenge_accept", e);
        return;
    }

    let handle = match state.match_manager.create_match(challenger, accepter).await {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to create match for {} and {}: {}", challenger, accepter, e);
            return;
        }
    };
    let game_id = handle.game_id();
    lobby.enter_game(&challenger, &accepter, game_id);

    let accepter_name = lobby.name_of(&accepter).cloned().unwrap_or_default();
    let challenger_name = lobby.name_of(&challenger).cloned().unwrap_or_default();
    drop(lobby);

    metrics::matches_started_total();
    metrics::active_matches(state.match_manager.active_match_count().await);
    logging::log_game_event(
        "started",
        &game_id.to_string(),
        &format!("{challenger_name} vs {accepter_name}"),
    );

    state
        .send_to(
            &challenger,
            ServerMessage::ChallengeAccepted {
                player_id: accepter,
                player_name: accepter_name,
            },
        )
        .await;

    for player_id in [challenger, accepter] {
        if let Some(outbox) = state.connection(&player_id).await {
            spawn_match_relay(state.clone(), player_id, game_id, outbox).await;
        }
    }
}

async fn make_move(player_id: PlayerId, game_id: GameId, track: usize, lane: Lane, state: &AppState) {
    match state.match_manager.move_token(game_id, player_id, track, lane).await {
        Ok(MatchResponse::Moved(outcome)) => {
            metrics::moves_total();
            if outcome.captured {
                metrics::captures_total();
            }
            if outcome.finished {
                state.lobby.write().await.finish_game(game_id);
                metrics::matches_finished_total("won");
                logging::log_game_event("finished", &game_id.to_string(), "game over");
            }
        }
        Ok(MatchResponse::Rejected(e)) => reject(player_id, "game_move", e),
        Ok(_) => {}
        Err(e) => reject(player_id, "game_move", e),
    }
}

/// Subscribe `player_id` to a match and forward its snapshots to their
/// connection until the match stops or the player goes away.
async fn spawn_match_relay(
    state: AppState,
    player_id: PlayerId,
    game_id: GameId,
    outbox: mpsc::Sender<ServerMessage>,
) {
    let (update_tx, mut update_rx) = mpsc::channel::<MatchUpdate>(UPDATE_CAPACITY);
    if let Err(e) = state
        .match_manager
        .subscribe(game_id, player_id, update_tx)
        .await
    {
        warn!("Failed to subscribe {} to match {}: {}", player_id, game_id, e);
        return;
    }

    tokio::spawn(async move {
        while let Some(update) = update_rx.recv().await {
            let message = match update {
                MatchUpdate::Updated(game) => ServerMessage::GameUpdate { game },
                MatchUpdate::Finished(game) => ServerMessage::GameDone { game },
            };
            if outbox.send(message).await.is_err() {
                break;
            }
        }
    });
}

/// Remove a player and abandon their game, if any.
async fn disconnect(player_id: PlayerId, state: &AppState) {
    let connection_count = {
        let mut connections = state.connections.write().await;
        connections.remove(&player_id);
        connections.len()
    };
    metrics::websocket_connections_active(connection_count);

    let Some(entry) = state.lobby.write().await.leave(&player_id) else {
        return;
    };
    logging::log_connection(&player_id.to_string(), entry.name.as_str(), false);

    let Some(game_id) = entry.game else {
        return;
    };

    let opponent = state
        .match_manager
        .get_view(game_id)
        .await
        .ok()
        .map(|view| {
            if view.player1.pid == player_id {
                view.player2.pid
            } else {
                view.player1.pid
            }
        });

    // Stop the leaver's relay before the match goes away
    if let Err(e) = state.match_manager.unsubscribe(game_id, player_id).await {
        warn!("Failed to unsubscribe {} from match {}: {}", player_id, game_id, e);
    }
    if let Err(e) = state.match_manager.close_match(game_id).await {
        warn!("Failed to close match {}: {}", game_id, e);
    }
    state.lobby.write().await.finish_game(game_id);

    metrics::matches_finished_total("abandoned");
    metrics::active_matches(state.match_manager.active_match_count().await);
    logging::log_game_event(
        "abandoned",
        &game_id.to_string(),
        &format!("{} left", entry.name),
    );

    if let Some(opponent) = opponent {
        state
            .send_to(&opponent, ServerMessage::OpponentLeft { game_id })
            .await;
    }
}

fn reject(player_id: PlayerId, request: &str, reason: impl std::fmt::Display) {
    logging::log_rejected_request(&player_id.to_string(), request, &reason.to_string());
}
