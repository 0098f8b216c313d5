//! Handing `PAID` tracks to generation workers and recording their results.

use std::sync::Arc;

use station_core::eligibility;
use station_core::types::DbId;
use station_db::models::track::Track;

use crate::error::SchedulerError;
use crate::store::TrackStore;

/// Claim and report operations for the generation worker.
///
/// Claims are single atomic store calls. A track is handed to at most one
/// caller no matter how many claim concurrently.
#[derive(Clone)]
pub struct GenerationClaim {
    store: Arc<dyn TrackStore>,
}

impl GenerationClaim {
    pub fn new(store: Arc<dyn TrackStore>) -> Self {
        Self { store }
    }

    /// Oldest `PAID` track not already being claimed, now `GENERATING`.
    pub async fn claim_next_paid(&self) -> Result<Option<Track>, SchedulerError> {
        let claimed = self.store.claim_next_paid().await?;
        if let Some(track) = &claimed {
            tracing::info!(track_id = track.id, "Claimed track for generation");
        }
        Ok(claimed)
    }

    /// Claim one specific track. `None` unless it is still `PAID`.
    pub async fn claim_paid_by_id(&self, track_id: DbId) -> Result<Option<Track>, SchedulerError> {
        let claimed = self.store.claim_paid_by_id(track_id).await?;
        match &claimed {
            Some(_) => tracing::info!(track_id, "Claimed track for generation"),
            None => tracing::debug!(track_id, "Track not claimable"),
        }
        Ok(claimed)
    }

    /// `GENERATING -> READY`.
    ///
    /// The artifact is not checked beyond a warning; a track whose reference
    /// does not match its id is simply never selected for playback.
    pub async fn mark_ready(
        &self,
        track_id: DbId,
        audio_url: &str,
        provider_request_id: Option<&str>,
    ) -> Result<Option<Track>, SchedulerError> {
        if !eligibility::is_playable(track_id, Some(audio_url)) {
            tracing::warn!(track_id, audio_url, "Audio reference will not pass eligibility");
        }
        let track = self
            .store
            .mark_ready(track_id, audio_url, provider_request_id)
            .await?;
        if track.is_some() {
            tracing::info!(track_id, "Track ready");
        }
        Ok(track)
    }

    /// `GENERATING -> FAILED`.
    pub async fn mark_failed(
        &self,
        track_id: DbId,
        reason: &str,
    ) -> Result<Option<Track>, SchedulerError> {
        let track = self.store.mark_failed(track_id, reason).await?;
        if track.is_some() {
            tracing::warn!(track_id, reason, "Track generation failed");
        }
        Ok(track)
    }
}
