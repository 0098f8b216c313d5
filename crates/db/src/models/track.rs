//! Track entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use station_core::payment::PaymentProof;
use station_core::selection::Candidate;
use station_core::track_status::{TrackSource, TrackStatus};
use station_core::types::{DbId, StatusId, Timestamp};

/// A row from the `tracks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Track {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub prompt: String,
    pub duration_secs: i32,
    pub source_id: StatusId,
    pub status_id: StatusId,
    pub price_cents: i64,
    pub payment_proof: Option<Json<PaymentProof>>,
    pub provider_request_id: Option<String>,
    pub audio_url: Option<String>,
    pub failure_reason: Option<String>,
    pub rating_score: f64,
    pub rating_count: i32,
    pub replay_of_track_id: Option<DbId>,
    pub claimed_at: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub last_played_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Track {
    /// Decoded status. `None` only if the row carries an id the code does not know.
    pub fn status(&self) -> Option<TrackStatus> {
        TrackStatus::from_id(self.status_id)
    }

    pub fn source(&self) -> Option<TrackSource> {
        TrackSource::from_id(self.source_id)
    }

    pub fn is_replay(&self) -> bool {
        self.source() == Some(TrackSource::Replay)
    }
}

impl Candidate for Track {
    fn track_id(&self) -> DbId {
        self.id
    }

    fn status(&self) -> Option<TrackStatus> {
        Track::status(self)
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }

    fn rating_score(&self) -> f64 {
        self.rating_score
    }

    fn rating_count(&self) -> i32 {
        self.rating_count
    }

    fn last_played_at(&self) -> Option<Timestamp> {
        self.last_played_at
    }

    fn audio_url(&self) -> Option<&str> {
        self.audio_url.as_deref()
    }
}

/// DTO for submitting a new track via `POST /api/v1/tracks`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitTrack {
    pub user_id: Option<DbId>,
    pub prompt: String,
    pub duration_secs: i32,
    pub price_cents: Option<i64>,
}

/// DTO the generation worker reports on success.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkReady {
    pub audio_url: String,
    pub provider_request_id: Option<String>,
}

/// DTO the generation worker reports on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkFailed {
    pub reason: String,
}
