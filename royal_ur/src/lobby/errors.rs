//! Lobby error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lobby errors
#[derive(Clone, Copy, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum LobbyError {
    /// A player tried to challenge themself
    #[error("can't challenge yourself")]
    SelfChallenge,

    /// No connected player has this id
    #[error("player does not exist")]
    UnknownPlayer,

    /// The id is already registered
    #[error("player already exists")]
    PlayerAlreadyExists,

    /// One of the players is already in a game
    #[error("player is already in a game")]
    PlayerBusy,

    /// There's no pending challenge between these players
    #[error("no such challenge")]
    NoSuchChallenge,
}

/// Result type for lobby operations
pub type LobbyResult<T> = Result<T, LobbyError>;
