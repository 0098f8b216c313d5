//! The advance operation: decide what plays next and put it on air.

use std::sync::Arc;

use serde::Serialize;
use station_core::clock::{self, Clock};
use station_core::selection::{self, Candidate};
use station_core::track_status::TrackStatus;
use station_core::types::DbId;
use station_db::models::track::Track;

use crate::error::SchedulerError;
use crate::notifier::{Notifier, StationUpdate, TrackAdvance};
use crate::store::{StationSnapshot, TrackStore};

/// Result of one [`StationScheduler::advance`] call.
#[derive(Debug, Clone, Serialize)]
pub struct AdvanceOutcome {
    /// `false` when the current track is still playing, or when a
    /// concurrent advance won the race. In the latter case the other
    /// fields describe the winner's state.
    pub advanced: bool,
    pub current_track: Option<Track>,
    pub playhead_seconds: i64,
    /// The replay row this call created and put on air, if any. Replay rows
    /// are only ever created by the advance that plays them.
    pub replay_created: Option<Track>,
}

impl AdvanceOutcome {
    fn unchanged(current_track: Option<Track>, playhead_seconds: i64) -> Self {
        Self {
            advanced: false,
            current_track,
            playhead_seconds,
            replay_created: None,
        }
    }
}

/// Drives the station from one track to the next.
#[derive(Clone)]
pub struct StationScheduler {
    store: Arc<dyn TrackStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl StationScheduler {
    pub fn new(
        store: Arc<dyn TrackStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
        }
    }

    /// What is on air and how far into it we are. Read only.
    pub async fn now_playing(&self) -> Result<(StationSnapshot, i64), SchedulerError> {
        let snapshot = self.store.station_snapshot().await?;
        let playhead = clock::playhead_seconds(
            snapshot.state.current_track_id,
            snapshot.state.current_started_at,
            self.clock.now(),
        );
        Ok((snapshot, playhead))
    }

    /// Move the station forward if the current track has finished.
    ///
    /// Returns early without writing anything while the current track is
    /// still playing. Store failures abort the call; a failure after the
    /// previous track was marked `DONE` leaves the station pointing at a
    /// finished track, which the next call recovers from.
    pub async fn advance(&self) -> Result<AdvanceOutcome, SchedulerError> {
        let now = self.clock.now();
        let snapshot = self.store.station_snapshot().await?;
        let previous_track_id = snapshot.state.current_track_id;
        let playhead = clock::playhead_seconds(
            previous_track_id,
            snapshot.state.current_started_at,
            now,
        );

        if let Some(current) = &snapshot.current {
            if !clock::is_finished(Some(current.duration_secs), playhead) {
                return Ok(AdvanceOutcome::unchanged(snapshot.current, playhead));
            }
            if self.store.mark_done(current.id, now).await?.is_some() {
                tracing::info!(track_id = current.id, playhead, "Track finished");
            }
        }

        let candidates = self.eligible_candidates().await?;
        let Some(selected) = selection::select_next(&candidates, now) else {
            return self.go_silent(previous_track_id).await;
        };

        let replaying = selected.status() == Some(TrackStatus::Done);
        let started = if replaying {
            self.store
                .start_replay(previous_track_id, selected.id, now)
                .await?
        } else {
            self.store
                .start_playback(previous_track_id, selected.id, now)
                .await?
        };
        let Some(started) = started else {
            tracing::info!(track_id = selected.id, replaying, "Lost advance race");
            return self.settled().await;
        };
        let replay_created = if replaying {
            started.current.clone()
        } else {
            None
        };

        tracing::info!(
            previous_track_id = ?previous_track_id,
            track_id = ?started.state.current_track_id,
            replay_of = ?replay_created.as_ref().and_then(|t| t.replay_of_track_id),
            "Station advanced"
        );

        self.notify(
            StationUpdate {
                current_track_id: started.state.current_track_id,
                current_started_at: started.state.current_started_at,
                current_track: started.current.clone(),
            },
            TrackAdvance {
                previous_track_id,
                new_track: started.current.clone(),
                playhead_seconds: 0,
            },
        )
        .await;

        Ok(AdvanceOutcome {
            advanced: true,
            current_track: started.current,
            playhead_seconds: 0,
            replay_created,
        })
    }

    /// `READY` and `DONE` tracks that pass the eligibility filter.
    async fn eligible_candidates(&self) -> Result<Vec<Track>, SchedulerError> {
        let all = self.store.list_candidates().await?;
        let total = all.len();
        let eligible: Vec<Track> = all.into_iter().filter(|t| t.is_playable()).collect();
        if eligible.len() < total {
            tracing::warn!(
                excluded = total - eligible.len(),
                "Skipping tracks without a matching audio artifact"
            );
        }
        Ok(eligible)
    }

    async fn go_silent(
        &self,
        previous_track_id: Option<DbId>,
    ) -> Result<AdvanceOutcome, SchedulerError> {
        if self.store.clear_station(previous_track_id).await?.is_none() {
            tracing::info!("Lost advance race while clearing the station");
            return self.settled().await;
        }

        tracing::info!(previous_track_id = ?previous_track_id, "Nothing to play, station idle");
        self.notify(
            StationUpdate {
                current_track_id: None,
                current_started_at: None,
                current_track: None,
            },
            TrackAdvance {
                previous_track_id,
                new_track: None,
                playhead_seconds: 0,
            },
        )
        .await;

        Ok(AdvanceOutcome {
            advanced: true,
            current_track: None,
            playhead_seconds: 0,
            replay_created: None,
        })
    }

    /// Re-read after losing a race and report the winner's state.
    async fn settled(&self) -> Result<AdvanceOutcome, SchedulerError> {
        let (snapshot, playhead) = self.now_playing().await?;
        Ok(AdvanceOutcome::unchanged(snapshot.current, playhead))
    }

    async fn notify(&self, update: StationUpdate, advance: TrackAdvance) {
        if let Err(e) = self.notifier.station_update(&update).await {
            tracing::warn!(error = %e, "Failed to deliver station update");
        }
        if let Err(e) = self.notifier.track_advance(&advance).await {
            tracing::warn!(error = %e, "Failed to deliver track advance");
        }
    }
}
