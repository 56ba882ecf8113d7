//! Networking layer for client-server communication.
//!
//! Messages travel as JSON text frames over a WebSocket. The transport
//! itself lives in the server crate.

/// Message types for client-server communication protocol.
pub mod messages;
