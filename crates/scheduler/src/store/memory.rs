//! [`TrackStore`] held entirely in process memory.
//!
//! Every operation runs under one async mutex, so the conditional writes are
//! atomic with respect to each other *within this process only*. Two
//! processes sharing nothing cannot coordinate through it. Use it for tests,
//! demos and single-process deployments.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use station_core::eligibility::artifact_file_name;
use station_core::track_status::{state_machine, TrackSource, TrackStatus};
use station_core::types::{DbId, Timestamp};
use station_db::models::station::StationState;
use station_db::models::track::Track;
use tokio::sync::Mutex;

use super::{StationSnapshot, TrackStore};
use crate::error::StoreError;

struct Inner {
    tracks: BTreeMap<DbId, Track>,
    station: StationState,
    next_id: DbId,
    writes: usize,
    unavailable: bool,
}

impl Inner {
    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("in-memory store switched off".into()));
        }
        Ok(())
    }

    /// Move the track to `to` and apply `f`, if its current status allows
    /// that edge. Each status has exactly one predecessor, so this is the
    /// same guard the SQL writes express with `WHERE status_id = ...`.
    fn transition(
        &mut self,
        track_id: DbId,
        to: TrackStatus,
        f: impl FnOnce(&mut Track),
    ) -> Option<Track> {
        let track = self.tracks.get_mut(&track_id)?;
        let from = track.status()?;
        if !state_machine::can_transition(from, to) {
            return None;
        }
        track.status_id = to.id();
        f(track);
        track.updated_at = Utc::now();
        Some(track.clone())
    }

    fn is_current(&self, expected_current: Option<DbId>) -> bool {
        self.station.current_track_id == expected_current
    }

    fn point_at(&mut self, track_id: DbId, now: Timestamp) {
        self.station.current_track_id = Some(track_id);
        self.station.current_started_at = Some(now);
        self.station.updated_at = Utc::now();
    }

    fn snapshot(&self) -> StationSnapshot {
        let current = self
            .station
            .current_track_id
            .and_then(|id| self.tracks.get(&id).cloned());
        StationSnapshot {
            state: self.station.clone(),
            current,
        }
    }
}

pub struct InMemoryTrackStore {
    inner: Mutex<Inner>,
}

impl Default for InMemoryTrackStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTrackStore {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            inner: Mutex::new(Inner {
                tracks: BTreeMap::new(),
                station: StationState {
                    id: StationState::SINGLETON_ID,
                    current_track_id: None,
                    current_started_at: None,
                    created_at: now,
                    updated_at: now,
                },
                next_id: 1,
                writes: 0,
                unavailable: false,
            }),
        }
    }

    /// Insert or replace a row as given. Does not count as a write.
    pub async fn insert(&self, track: Track) {
        let mut inner = self.inner.lock().await;
        inner.next_id = inner.next_id.max(track.id + 1);
        inner.tracks.insert(track.id, track);
    }

    /// Point the station at a track directly, bypassing the lifecycle.
    pub async fn set_station(&self, current_track_id: Option<DbId>, started_at: Option<Timestamp>) {
        let mut inner = self.inner.lock().await;
        inner.station.current_track_id = current_track_id;
        inner.station.current_started_at = started_at;
    }

    pub async fn track(&self, track_id: DbId) -> Option<Track> {
        self.inner.lock().await.tracks.get(&track_id).cloned()
    }

    pub async fn tracks(&self) -> Vec<Track> {
        self.inner.lock().await.tracks.values().cloned().collect()
    }

    /// Number of write operations attempted so far, successful or not.
    pub async fn write_count(&self) -> usize {
        self.inner.lock().await.writes
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().await.unavailable = unavailable;
    }
}

/// A generated track in `status` whose artifact is named after its id.
pub fn sample_track(id: DbId, status: TrackStatus, created_at: Timestamp) -> Track {
    Track {
        id,
        user_id: None,
        prompt: format!("sample track {id}"),
        duration_secs: 60,
        source_id: TrackSource::Generated.id(),
        status_id: status.id(),
        price_cents: 0,
        payment_proof: None,
        provider_request_id: None,
        audio_url: Some(format!("/audio/{}", artifact_file_name(id))),
        failure_reason: None,
        rating_score: 0.0,
        rating_count: 0,
        replay_of_track_id: None,
        claimed_at: None,
        started_at: None,
        finished_at: None,
        last_played_at: None,
        created_at,
        updated_at: created_at,
    }
}

#[async_trait]
impl TrackStore for InMemoryTrackStore {
    async fn station_snapshot(&self) -> Result<StationSnapshot, StoreError> {
        let inner = self.inner.lock().await;
        inner.check_available()?;
        Ok(inner.snapshot())
    }

    async fn mark_done(&self, track_id: DbId, now: Timestamp) -> Result<Option<Track>, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_available()?;
        inner.writes += 1;
        Ok(inner.transition(track_id, TrackStatus::Done, |t| {
            t.finished_at = Some(now);
            t.last_played_at = Some(now);
        }))
    }

    async fn list_candidates(&self) -> Result<Vec<Track>, StoreError> {
        let inner = self.inner.lock().await;
        inner.check_available()?;
        let mut candidates: Vec<Track> = inner
            .tracks
            .values()
            .filter(|t| match t.status() {
                Some(TrackStatus::Ready) => true,
                Some(TrackStatus::Done) => t.replay_of_track_id.is_none(),
                _ => false,
            })
            .cloned()
            .collect();
        candidates.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(candidates)
    }

    async fn start_playback(
        &self,
        expected_current: Option<DbId>,
        track_id: DbId,
        now: Timestamp,
    ) -> Result<Option<StationSnapshot>, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_available()?;
        inner.writes += 1;

        if !inner.is_current(expected_current) {
            return Ok(None);
        }
        if inner
            .transition(track_id, TrackStatus::Playing, |t| t.started_at = Some(now))
            .is_none()
        {
            return Ok(None);
        }

        inner.point_at(track_id, now);
        Ok(Some(inner.snapshot()))
    }

    async fn start_replay(
        &self,
        expected_current: Option<DbId>,
        source_id: DbId,
        now: Timestamp,
    ) -> Result<Option<StationSnapshot>, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_available()?;
        inner.writes += 1;

        if !inner.is_current(expected_current) {
            return Ok(None);
        }
        let Some(source) = inner
            .tracks
            .get_mut(&source_id)
            .filter(|t| t.status() == Some(TrackStatus::Done))
        else {
            return Ok(None);
        };
        source.last_played_at = Some(now);
        source.updated_at = Utc::now();
        let source = source.clone();

        let id = inner.next_id;
        inner.next_id += 1;
        let replay = Track {
            id,
            source_id: TrackSource::Replay.id(),
            status_id: TrackStatus::Playing.id(),
            price_cents: 0,
            payment_proof: None,
            failure_reason: None,
            rating_score: 0.0,
            rating_count: 0,
            replay_of_track_id: Some(source.id),
            claimed_at: None,
            started_at: Some(now),
            finished_at: None,
            last_played_at: None,
            created_at: now,
            updated_at: now,
            ..source
        };
        inner.tracks.insert(id, replay);
        inner.point_at(id, now);
        Ok(Some(inner.snapshot()))
    }

    async fn clear_station(
        &self,
        expected_current: Option<DbId>,
    ) -> Result<Option<StationState>, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_available()?;
        inner.writes += 1;

        if !inner.is_current(expected_current) {
            return Ok(None);
        }
        inner.station.current_track_id = None;
        inner.station.current_started_at = None;
        inner.station.updated_at = Utc::now();
        Ok(Some(inner.station.clone()))
    }

    async fn claim_next_paid(&self) -> Result<Option<Track>, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_available()?;
        inner.writes += 1;

        let oldest = inner
            .tracks
            .values()
            .filter(|t| t.status() == Some(TrackStatus::Paid))
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .map(|t| t.id);

        Ok(oldest.and_then(|id| {
            inner.transition(id, TrackStatus::Generating, |t| {
                t.claimed_at = Some(Utc::now());
            })
        }))
    }

    async fn claim_paid_by_id(&self, track_id: DbId) -> Result<Option<Track>, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_available()?;
        inner.writes += 1;
        Ok(inner.transition(track_id, TrackStatus::Generating, |t| {
            t.claimed_at = Some(Utc::now());
        }))
    }

    async fn mark_ready(
        &self,
        track_id: DbId,
        audio_url: &str,
        provider_request_id: Option<&str>,
    ) -> Result<Option<Track>, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_available()?;
        inner.writes += 1;
        Ok(inner.transition(track_id, TrackStatus::Ready, |t| {
            t.audio_url = Some(audio_url.to_string());
            if let Some(request_id) = provider_request_id {
                t.provider_request_id = Some(request_id.to_string());
            }
        }))
    }

    async fn mark_failed(&self, track_id: DbId, reason: &str) -> Result<Option<Track>, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_available()?;
        inner.writes += 1;
        Ok(inner.transition(track_id, TrackStatus::Failed, |t| {
            t.failure_reason = Some(reason.to_string());
            t.finished_at = Some(Utc::now());
        }))
    }
}
