//! Lobby of connected players and the challenges between them.
//!
//! This module implements:
//! - Registration of connected players with sanitized display names
//! - Challenge, accept and reject bookkeeping
//! - The list of players available for a game, broadcast periodically
//!
//! The lobby only tracks who is where. Creating the game after an accepted
//! challenge is the job of [`crate::matches::MatchManager`].
//!
//! ## Example
//!
//! ```
//! use royal_ur::entities::{GameId, PlayerId, PlayerName};
//! use royal_ur::lobby::Lobby;
//!
//! let mut lobby = Lobby::new();
//! let (alice, bob) = (PlayerId::generate(), PlayerId::generate());
//! lobby.join(alice, PlayerName::new("alice")).unwrap();
//! lobby.join(bob, PlayerName::new("bob")).unwrap();
//!
//! lobby.challenge(&alice, &bob).unwrap();
//! lobby.accept(&bob, &alice).unwrap();
//! lobby.enter_game(&alice, &bob, GameId::generate());
//! assert!(lobby.available_players().is_empty());
//! ```

pub mod errors;
pub mod registry;

pub use errors::{LobbyError, LobbyResult};
pub use registry::{Lobby, LobbyEntry};
