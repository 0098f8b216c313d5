//! The claim → generate → store → report loop.

use std::sync::Arc;
use std::time::Duration;

use station_core::track_status::TrackStatus;
use station_db::models::track::Track;
use station_scheduler::{GenerationClaim, SchedulerError, StationScheduler};
use tokio_util::sync::CancellationToken;

use crate::artifacts::{ArtifactError, ArtifactStore};
use crate::provider::{AudioProvider, GenerationRequest, ProviderError};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Why a claimed track could not be produced. Recorded as its failure reason.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Audio provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Storing audio failed: {0}")]
    Artifact(#[from] ArtifactError),
}

pub struct GenerationWorker {
    claim: GenerationClaim,
    scheduler: StationScheduler,
    provider: Arc<dyn AudioProvider>,
    artifacts: Arc<dyn ArtifactStore>,
    poll_interval: Duration,
}

impl GenerationWorker {
    pub fn new(
        claim: GenerationClaim,
        scheduler: StationScheduler,
        provider: Arc<dyn AudioProvider>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            claim,
            scheduler,
            provider,
            artifacts,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Poll until `cancel` fires. Each tick works through every waiting track.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Generation worker started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Generation worker shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.drain(&cancel).await {
                        tracing::error!(error = %e, "Generation cycle failed");
                    }
                }
            }
        }
    }

    async fn drain(&self, cancel: &CancellationToken) -> Result<(), SchedulerError> {
        while !cancel.is_cancelled() {
            if self.run_once().await?.is_none() {
                break;
            }
        }
        Ok(())
    }

    /// Claim and process at most one track.
    ///
    /// Returns `None` when nothing was waiting, otherwise the track as it
    /// was left (`READY` or `FAILED`). Only store errors are returned;
    /// provider and artifact failures are recorded on the track.
    pub async fn run_once(&self) -> Result<Option<Track>, SchedulerError> {
        let Some(track) = self.claim.claim_next_paid().await? else {
            return Ok(None);
        };

        let outcome = match self.produce(&track).await {
            Ok((audio_url, provider_request_id)) => {
                self.claim
                    .mark_ready(track.id, &audio_url, provider_request_id.as_deref())
                    .await?
            }
            Err(e) => self.claim.mark_failed(track.id, &e.to_string()).await?,
        };

        let Some(updated) = outcome else {
            tracing::warn!(track_id = track.id, "Track left GENERATING before its result was recorded");
            return Ok(Some(track));
        };

        if updated.status() == Some(TrackStatus::Ready) {
            match self.scheduler.advance().await {
                Ok(result) if result.advanced => {
                    tracing::info!(
                        now_playing = ?result.current_track.as_ref().map(|t| t.id),
                        "Station advanced after generation"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Advance after generation failed"),
            }
        }

        Ok(Some(updated))
    }

    async fn produce(&self, track: &Track) -> Result<(String, Option<String>), GenerationError> {
        let request = GenerationRequest {
            track_id: track.id,
            prompt: track.prompt.clone(),
            duration_secs: track.duration_secs,
        };
        let audio = self.provider.generate(&request).await?;
        let audio_url = self.artifacts.store(track.id, &audio.bytes).await?;
        Ok((audio_url, audio.provider_request_id))
    }
}
