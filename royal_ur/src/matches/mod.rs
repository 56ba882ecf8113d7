//! Match module running each game in its own async actor.
//!
//! This module implements:
//! - MatchActor: Async actor owning a single game and its dice
//! - MatchManager: Registry that spawns match actors and forgets them once
//!   they stop
//! - Message-based communication with tokio channels
//! - An optional turn timer that passes the turn of a stalled player
//!
//! ## Architecture
//!
//! Each match runs in a separate Tokio task with an mpsc message inbox.
//! Participants subscribe with their own channel and receive a fresh
//! [`GameView`](crate::game::GameView) after every change. The actor stops
//! when the game finishes or the match is closed.
//!
//! ## Example
//!
//! ```no_run
//! use royal_ur::entities::PlayerId;
//! use royal_ur::matches::{MatchConfig, MatchManager};
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = MatchManager::new(MatchConfig::default());
//!     let (alice, bob) = (PlayerId::generate(), PlayerId::generate());
//!
//!     let handle = manager.create_match(alice, bob).await.unwrap();
//!     let view = manager.get_view(handle.game_id()).await.unwrap();
//!     println!("{:?} goes first", view.current_player);
//! }
//! ```

pub mod actor;
pub mod config;
pub mod errors;
pub mod manager;
pub mod messages;

pub use actor::{MatchActor, MatchHandle};
pub use config::MatchConfig;
pub use errors::{MatchError, MatchResult};
pub use manager::{MatchManager, MatchMetadata};
pub use messages::{MatchMessage, MatchResponse, MatchUpdate};
