//! Station HTTP API.
//!
//! Exposes config, state, error handling, routes and the WebSocket
//! infrastructure so the binary and the integration tests build the same app.

pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
