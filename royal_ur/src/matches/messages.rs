//! Match actor message types.

use crate::game::{
    GameView, MoveOutcome, RollOutcome, UserError,
    entities::{Lane, PlayerId},
};
use tokio::sync::{mpsc, oneshot};

/// Messages that can be sent to a MatchActor
#[derive(Debug)]
pub enum MatchMessage {
    /// Roll the dice for the current player
    Roll {
        player_id: PlayerId,
        response: oneshot::Sender<MatchResponse>,
    },

    /// Move a token by the pending roll
    Move {
        player_id: PlayerId,
        track: usize,
        lane: Lane,
        response: oneshot::Sender<MatchResponse>,
    },

    /// Get a snapshot of the game
    GetView {
        response: oneshot::Sender<GameView>,
    },

    /// Subscribe to game snapshots. The current snapshot is sent right away.
    Subscribe {
        player_id: PlayerId,
        sender: mpsc::Sender<MatchUpdate>,
    },

    /// Unsubscribe from game snapshots
    Unsubscribe { player_id: PlayerId },

    /// Stop the match
    Close {
        response: oneshot::Sender<MatchResponse>,
    },
}

/// Snapshot pushed to subscribers after every state change
#[derive(Debug, Clone)]
pub enum MatchUpdate {
    /// The game changed and is still running
    Updated(GameView),
    /// The game has a winner
    Finished(GameView),
}

impl MatchUpdate {
    pub fn view(&self) -> &GameView {
        match self {
            MatchUpdate::Updated(view) | MatchUpdate::Finished(view) => view,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, MatchUpdate::Finished(_))
    }
}

/// Response from match operations
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResponse {
    /// Dice were rolled
    Rolled(RollOutcome),

    /// A token moved
    Moved(MoveOutcome),

    /// The game refused the action; nothing changed
    Rejected(UserError),

    /// Operation succeeded
    Success,
}

impl MatchResponse {
    /// Check if response is success
    pub fn is_success(&self) -> bool {
        !matches!(self, MatchResponse::Rejected(_))
    }

    /// Get the rejection reason, if any
    pub fn error(&self) -> Option<UserError> {
        match self {
            MatchResponse::Rejected(e) => Some(*e),
            _ => None,
        }
    }
}

impl<T> From<Result<T, UserError>> for MatchResponse
where
    T: Into<MatchResponse>,
{
    fn from(value: Result<T, UserError>) -> Self {
        match value {
            Ok(ok) => ok.into(),
            Err(e) => MatchResponse::Rejected(e),
        }
    }
}

impl From<RollOutcome> for MatchResponse {
    fn from(value: RollOutcome) -> Self {
        MatchResponse::Rolled(value)
    }
}

impl From<MoveOutcome> for MatchResponse {
    fn from(value: MoveOutcome) -> Self {
        MatchResponse::Moved(value)
    }
}
