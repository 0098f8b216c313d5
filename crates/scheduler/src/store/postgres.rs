//! [`TrackStore`] over PostgreSQL, delegating to the `station-db` repositories.

use async_trait::async_trait;
use station_core::types::{DbId, Timestamp};
use station_db::models::station::StationState;
use station_db::models::track::Track;
use station_db::repositories::{StationRepo, TrackRepo};
use station_db::DbPool;

use super::{StationSnapshot, TrackStore};
use crate::error::StoreError;

#[derive(Clone)]
pub struct PgTrackStore {
    pool: DbPool,
}

impl PgTrackStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrackStore for PgTrackStore {
    async fn station_snapshot(&self) -> Result<StationSnapshot, StoreError> {
        let state = StationRepo::get(&self.pool).await?;
        let current = match state.current_track_id {
            Some(id) => TrackRepo::find_by_id(&self.pool, id).await?,
            None => None,
        };
        Ok(StationSnapshot { state, current })
    }

    async fn mark_done(&self, track_id: DbId, now: Timestamp) -> Result<Option<Track>, StoreError> {
        Ok(TrackRepo::mark_done(&self.pool, track_id, now).await?)
    }

    async fn list_candidates(&self) -> Result<Vec<Track>, StoreError> {
        Ok(TrackRepo::list_candidates(&self.pool).await?)
    }

    async fn start_playback(
        &self,
        expected_current: Option<DbId>,
        track_id: DbId,
        now: Timestamp,
    ) -> Result<Option<StationSnapshot>, StoreError> {
        let started = StationRepo::start_playback(&self.pool, expected_current, track_id, now).await?;
        Ok(started.map(|(state, track)| StationSnapshot {
            state,
            current: Some(track),
        }))
    }

    async fn start_replay(
        &self,
        expected_current: Option<DbId>,
        source_id: DbId,
        now: Timestamp,
    ) -> Result<Option<StationSnapshot>, StoreError> {
        let started = StationRepo::start_replay(&self.pool, expected_current, source_id, now).await?;
        Ok(started.map(|(state, track)| StationSnapshot {
            state,
            current: Some(track),
        }))
    }

    async fn clear_station(
        &self,
        expected_current: Option<DbId>,
    ) -> Result<Option<StationState>, StoreError> {
        Ok(StationRepo::clear(&self.pool, expected_current).await?)
    }

    async fn claim_next_paid(&self) -> Result<Option<Track>, StoreError> {
        Ok(TrackRepo::claim_next_paid(&self.pool).await?)
    }

    async fn claim_paid_by_id(&self, track_id: DbId) -> Result<Option<Track>, StoreError> {
        Ok(TrackRepo::claim_paid_by_id(&self.pool, track_id).await?)
    }

    async fn mark_ready(
        &self,
        track_id: DbId,
        audio_url: &str,
        provider_request_id: Option<&str>,
    ) -> Result<Option<Track>, StoreError> {
        Ok(TrackRepo::mark_ready(&self.pool, track_id, audio_url, provider_request_id).await?)
    }

    async fn mark_failed(&self, track_id: DbId, reason: &str) -> Result<Option<Track>, StoreError> {
        Ok(TrackRepo::mark_failed(&self.pool, track_id, reason).await?)
    }
}
