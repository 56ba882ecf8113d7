//! # Royal Ur
//!
//! A Royal Game of Ur implementation for two players over the network.
//!
//! This library provides the game engine, the lobby where players find and
//! challenge each other, and the async actors that run each match. The
//! rules live in a plain [`Game`] struct whose every action is a checked
//! transition: an illegal request changes nothing.
//!
//! ## Rules in brief
//!
//! - Each player races 7 tokens along a 15-cell track and off the end
//! - A roll is the number of heads in four coin flips, 0 to 4
//! - Cells 5 to 12 hold one token at a time; landing on an opponent there
//!   sends them back to the pool
//! - Cell 8 can't be entered while occupied
//! - Landing on 4, 8 or 14 grants another go
//! - A roll of 0, or one no token can use, passes the turn
//!
//! ## Core Modules
//!
//! - [`game`]: Game state machine, entities, and rules
//! - [`lobby`]: Connected players and pending challenges
//! - [`matches`]: One actor per running game, plus the registry of them
//! - [`net`]: Wire message protocol
//!
//! ## Example
//!
//! ```
//! use royal_ur::{Game, entities::{GameState, PlayerId}};
//!
//! let mut game = Game::new(PlayerId::generate(), PlayerId::generate());
//! let first = game.begin_with_rolls(3, 1).unwrap();
//! assert_eq!(game.state(), GameState::InProgress);
//! assert_eq!(game.current_player_id(), Some(first));
//! ```

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    Game, GameEvent, GameView, MoveOutcome, RollOutcome, UserError,
    constants::{self, MAX_ROLL, TOKENS_PER_PLAYER, TRACK_LEN},
    entities,
};

/// Lobby of available players and challenges.
pub mod lobby;
pub use lobby::{Lobby, LobbyError};

/// Match actors and registry.
pub mod matches;
pub use matches::{MatchConfig, MatchError, MatchManager, MatchUpdate};

/// Wire protocol.
pub mod net;
pub use net::messages;
