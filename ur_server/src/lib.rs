//! Royal Game of Ur server.
//!
//! Players connect over a WebSocket, meet in the lobby and play matches run
//! by one actor each. See [`api`] for the endpoints.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
