//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`StationEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use station_core::types::DbId;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// What is on air changed (or went off air).
pub const STATION_UPDATE: &str = "station_update";

/// The scheduler moved from one track to the next.
pub const TRACK_ADVANCE: &str = "track_advance";

/// The upcoming queue changed (a track became READY).
pub const QUEUE_UPDATE: &str = "queue_update";

// ---------------------------------------------------------------------------
// StationEvent
// ---------------------------------------------------------------------------

/// A change subscribers may want to hear about.
///
/// Constructed via [`StationEvent::new`] and enriched with
/// [`with_track`](StationEvent::with_track) and
/// [`with_payload`](StationEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationEvent {
    /// One of [`STATION_UPDATE`], [`TRACK_ADVANCE`], [`QUEUE_UPDATE`].
    pub event_type: String,

    /// Track the event is about, when there is one.
    pub track_id: Option<DbId>,

    /// Event-specific JSON payload.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl StationEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            track_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach the track this event concerns.
    pub fn with_track(mut self, track_id: Option<DbId>) -> Self {
        self.track_id = track_id;
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Wire form relayed to realtime subscribers: `{ "type", "payload" }`.
    pub fn to_wire(&self) -> serde_json::Value {
        serde_json::json!({
            "type": self.event_type,
            "payload": self.payload,
        })
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// ```rust
/// use station_events::bus::{EventBus, StationEvent, STATION_UPDATE};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(StationEvent::new(STATION_UPDATE));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<StationEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns how many subscribers will see it. Zero subscribers is not an
    /// error; the event is simply dropped.
    pub fn publish(&self, event: StationEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(dropped) => {
                tracing::trace!(event_type = %dropped.0.event_type, "No subscribers for event");
                0
            }
        }
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<StationEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
