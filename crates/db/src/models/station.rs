//! Station state singleton.

use serde::Serialize;
use sqlx::FromRow;
use station_core::types::{DbId, Timestamp};

/// The single row of `station_state`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StationState {
    pub id: i16,
    pub current_track_id: Option<DbId>,
    pub current_started_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl StationState {
    /// Primary key of the only row.
    pub const SINGLETON_ID: i16 = 1;

    pub fn is_idle(&self) -> bool {
        self.current_track_id.is_none()
    }
}
