use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

use super::super::game::{
    GameView,
    entities::{GameId, Lane, PlayerId, PlayerName},
};

/// A message from a client to the server, indicating some lobby request or
/// game action. Sent as JSON with a `type` tag.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// The user wants a different display name.
    NameChange { name: PlayerName },
    /// The user challenges another available player.
    ChallengePlayer { player_id: PlayerId },
    /// The user accepts a challenge from `player_id`, starting a game.
    ChallengeAccept { player_id: PlayerId },
    /// The user turns down a challenge from `player_id`.
    ChallengeReject { player_id: PlayerId },
    /// The user rolls the dice in one of their games.
    Roll { game_id: GameId },
    /// The user moves the token at `track` by their pending roll.
    GameMove {
        game_id: GameId,
        track: usize,
        lane: Lane,
    },
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameChange { name } => write!(f, "changed their name to {name}"),
            Self::ChallengePlayer { player_id } => write!(f, "challenged {player_id}"),
            Self::ChallengeAccept { player_id } => {
                write!(f, "accepted the challenge from {player_id}")
            }
            Self::ChallengeReject { player_id } => {
                write!(f, "rejected the challenge from {player_id}")
            }
            Self::Roll { game_id } => write!(f, "rolled in game {game_id}"),
            Self::GameMove {
                game_id,
                track,
                lane,
            } => write!(f, "moved from {track} ({lane:?}) in game {game_id}"),
        }
    }
}

/// A message from the server to a client.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// First message on every connection, with the identity the server
    /// assigned.
    Welcome { player_id: PlayerId, name: PlayerName },
    /// Players currently free to be challenged, keyed by id.
    ConnectedPlayers {
        players: BTreeMap<PlayerId, PlayerName>,
    },
    /// Someone challenged this user.
    IncomingChallenge {
        player_id: PlayerId,
        player_name: PlayerName,
    },
    /// The challenged player accepted; a game follows.
    ChallengeAccepted {
        player_id: PlayerId,
        player_name: PlayerName,
    },
    /// The challenged player declined.
    ChallengeRejected {
        player_id: PlayerId,
        player_name: PlayerName,
    },
    /// The game changed and is still running.
    GameUpdate { game: GameView },
    /// The game has a winner. This is the last snapshot.
    GameDone { game: GameView },
    /// The opponent disconnected and the game was abandoned.
    OpponentLeft { game_id: GameId },
    /// The client sent something the server couldn't parse.
    Error { message: String },
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Welcome { name, .. } => write!(f, "welcome {name}"),
            Self::ConnectedPlayers { players } => {
                write!(f, "{} players available", players.len())
            }
            Self::IncomingChallenge { player_name, .. } => {
                write!(f, "{player_name} challenged you")
            }
            Self::ChallengeAccepted { player_name, .. } => {
                write!(f, "{player_name} accepted your challenge")
            }
            Self::ChallengeRejected { player_name, .. } => {
                write!(f, "{player_name} rejected your challenge")
            }
            Self::GameUpdate { .. } => write!(f, "game update"),
            Self::GameDone { .. } => write!(f, "game over"),
            Self::OpponentLeft { game_id } => write!(f, "opponent left game {game_id}"),
            Self::Error { message } => write!(f, "{message}"),
        }
    }
}
