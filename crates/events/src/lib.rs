//! Station event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`StationEvent`]: the envelope every station/queue change travels in.
//!
//! Delivery is fire-and-forget: publishing never fails and never blocks.

pub mod bus;

pub use bus::{EventBus, StationEvent};
