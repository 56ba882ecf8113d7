//! Read-only lobby and game API handlers.
//!
//! # Examples
//!
//! List running games:
//! ```bash
//! curl http://localhost:3000/api/v1/games
//! ```
//!
//! Fetch one game's snapshot:
//! ```bash
//! curl http://localhost:3000/api/v1/games/6a1d3c3e-8f0b-4c1e-9d4b-3f2a1b0c9d8e
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use royal_ur::{
    GameView, MatchError,
    entities::{GameId, PlayerId, PlayerName},
    matches::MatchMetadata,
};
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct PlayerListItem {
    pub id: PlayerId,
    pub name: PlayerName,
    /// The game the player is in, if any
    pub game_id: Option<GameId>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// List every connected player.
///
/// # Response
///
/// Returns `200 OK` with players sorted by name:
/// ```json
/// [
///   { "id": "…", "name": "alice", "game_id": null },
///   { "id": "…", "name": "bob", "game_id": "…" }
/// ]
/// ```
pub async fn list_players(State(state): State<AppState>) -> Json<Vec<PlayerListItem>> {
    let lobby = state.lobby.read().await;
    let mut items: Vec<PlayerListItem> = lobby
        .players()
        .map(|(id, entry)| PlayerListItem {
            id: *id,
            name: entry.name.clone(),
            game_id: entry.game,
        })
        .collect();
    drop(lobby);

    items.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    Json(items)
}

/// List all running games.
///
/// # Response
///
/// Returns `200 OK` with an array of game summaries:
/// ```json
/// [
///   { "id": "…", "player1": "…", "player2": "…", "turn": 12, "state": 1 }
/// ]
/// ```
pub async fn list_games(State(state): State<AppState>) -> Json<Vec<MatchMetadata>> {
    Json(state.match_manager.list_matches().await)
}

/// Get the full snapshot of one running game.
///
/// # Errors
///
/// - `400 Bad Request`: The id isn't a UUID
/// - `404 Not Found`: No running game has this id
pub async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
) -> Result<Json<GameView>, (StatusCode, Json<ErrorResponse>)> {
    match state.match_manager.get_view(game_id).await {
        Ok(view) => Ok(Json(view)),
        Err(e @ (MatchError::NotFound(_) | MatchError::Closed)) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}
