//! Royal Game of Ur rules engine.
//!
//! This module provides the foundational game implementation including:
//! - Player and track entities, with the track stored as per-cell player flags
//! - Dice that count heads over four coin flips
//! - Move legality, captures, bonus squares, and win detection
//! - Plain snapshots for broadcasting and rebuilding games

pub mod constants;
pub mod entities;
pub mod state_machine;

pub use state_machine::{Game, GameEvent, GameView, MoveOutcome, RollOutcome, UserError};
