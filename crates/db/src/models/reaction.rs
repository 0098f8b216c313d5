//! Listener reaction model and DTO.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use station_core::types::{DbId, Timestamp};

/// A row from the `track_reactions` table. One per (track, listener).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrackReaction {
    pub id: DbId,
    pub track_id: DbId,
    pub listener: String,
    pub value: i16,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for `POST /api/v1/tracks/{id}/reactions`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReaction {
    pub listener: String,
    pub value: i16,
}
