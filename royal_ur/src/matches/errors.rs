//! Match error types.

use thiserror::Error;

use crate::game::{UserError, entities::GameId};

/// Match errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MatchError {
    /// No live match has this id
    #[error("match {0} not found")]
    NotFound(GameId),

    /// The match actor has stopped
    #[error("match is closed")]
    Closed,

    /// Match configuration failed validation
    #[error("invalid match config: {0}")]
    InvalidConfig(String),

    /// The game rejected the action
    #[error(transparent)]
    Game(#[from] UserError),
}

/// Result type for match operations
pub type MatchResult<T> = Result<T, MatchError>;
