//! Realtime push to listeners.
//!
//! Clients connect at `/api/v1/ws` and receive every station event as a
//! `{ "type", "payload" }` text frame. Nothing is read from clients beyond
//! close and pong frames.

mod handler;
mod heartbeat;
pub mod manager;
mod relay;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
pub use relay::StationRelay;
