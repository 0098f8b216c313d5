//! Storage boundary for the scheduler and the generation claim.
//!
//! Every write is conditional. A write whose precondition no longer holds
//! returns `Ok(None)` instead of an error, and callers treat that as "someone
//! else got there first".

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use station_core::types::{DbId, Timestamp};
use station_db::models::station::StationState;
use station_db::models::track::Track;

use crate::error::StoreError;

/// Station state plus the row it points at, read together.
#[derive(Debug, Clone)]
pub struct StationSnapshot {
    pub state: StationState,
    /// `None` when the station is idle or the referenced row has vanished.
    pub current: Option<Track>,
}

#[async_trait]
pub trait TrackStore: Send + Sync {
    async fn station_snapshot(&self) -> Result<StationSnapshot, StoreError>;

    /// `PLAYING -> DONE`. `None` if the track was not `PLAYING`.
    async fn mark_done(&self, track_id: DbId, now: Timestamp) -> Result<Option<Track>, StoreError>;

    /// Every `READY` track and every `DONE` original, oldest first. Played
    /// replays are not candidates.
    async fn list_candidates(&self) -> Result<Vec<Track>, StoreError>;

    /// Move `track_id` to `PLAYING` and put it on air, provided the station
    /// still shows `expected_current`.
    async fn start_playback(
        &self,
        expected_current: Option<DbId>,
        track_id: DbId,
        now: Timestamp,
    ) -> Result<Option<StationSnapshot>, StoreError>;

    /// Clone a `DONE` track into a free replay row and put that row on air,
    /// provided the station still shows `expected_current`. Nothing is
    /// written when the precondition fails, so no replay row is left behind.
    async fn start_replay(
        &self,
        expected_current: Option<DbId>,
        source_id: DbId,
        now: Timestamp,
    ) -> Result<Option<StationSnapshot>, StoreError>;

    /// Take the station off air, provided it still shows `expected_current`.
    async fn clear_station(
        &self,
        expected_current: Option<DbId>,
    ) -> Result<Option<StationState>, StoreError>;

    async fn claim_next_paid(&self) -> Result<Option<Track>, StoreError>;

    async fn claim_paid_by_id(&self, track_id: DbId) -> Result<Option<Track>, StoreError>;

    async fn mark_ready(
        &self,
        track_id: DbId,
        audio_url: &str,
        provider_request_id: Option<&str>,
    ) -> Result<Option<Track>, StoreError>;

    async fn mark_failed(&self, track_id: DbId, reason: &str) -> Result<Option<Track>, StoreError>;
}
