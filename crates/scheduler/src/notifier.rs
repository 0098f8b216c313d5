//! Outbound station notifications.
//!
//! Delivery is best effort. The scheduler logs a failed notification and
//! carries on; it never rolls back a playback change because a listener
//! could not be told about it.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use station_core::types::{DbId, Timestamp};
use station_db::models::track::Track;
use station_events::bus::{STATION_UPDATE, TRACK_ADVANCE};
use station_events::{EventBus, StationEvent};

use crate::error::NotifyError;

/// What is on air right now.
#[derive(Debug, Clone, Serialize)]
pub struct StationUpdate {
    pub current_track_id: Option<DbId>,
    pub current_started_at: Option<Timestamp>,
    pub current_track: Option<Track>,
}

/// The station moved from one track to the next (or to silence).
#[derive(Debug, Clone, Serialize)]
pub struct TrackAdvance {
    pub previous_track_id: Option<DbId>,
    pub new_track: Option<Track>,
    pub playhead_seconds: i64,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn station_update(&self, update: &StationUpdate) -> Result<(), NotifyError>;

    async fn track_advance(&self, advance: &TrackAdvance) -> Result<(), NotifyError>;
}

/// Publishes notifications onto the in-process [`EventBus`].
pub struct EventBusNotifier {
    bus: Arc<EventBus>,
}

impl EventBusNotifier {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl Notifier for EventBusNotifier {
    async fn station_update(&self, update: &StationUpdate) -> Result<(), NotifyError> {
        let event = StationEvent::new(STATION_UPDATE)
            .with_track(update.current_track_id)
            .with_payload(serde_json::to_value(update)?);
        let receivers = self.bus.publish(event);
        tracing::debug!(receivers, "Published station update");
        Ok(())
    }

    async fn track_advance(&self, advance: &TrackAdvance) -> Result<(), NotifyError> {
        let event = StationEvent::new(TRACK_ADVANCE)
            .with_track(advance.new_track.as_ref().map(|t| t.id))
            .with_payload(serde_json::to_value(advance)?);
        let receivers = self.bus.publish(event);
        tracing::debug!(receivers, "Published track advance");
        Ok(())
    }
}

/// Writes notifications to the log. For processes with no realtime clients.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn station_update(&self, update: &StationUpdate) -> Result<(), NotifyError> {
        tracing::info!(current_track_id = ?update.current_track_id, "Station update");
        Ok(())
    }

    async fn track_advance(&self, advance: &TrackAdvance) -> Result<(), NotifyError> {
        tracing::info!(
            previous_track_id = ?advance.previous_track_id,
            new_track_id = ?advance.new_track.as_ref().map(|t| t.id),
            "Track advance"
        );
        Ok(())
    }
}
