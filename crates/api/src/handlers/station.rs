//! Handlers for `/station`.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use station_core::types::{DbId, Timestamp};
use station_db::models::track::Track;
use station_scheduler::AdvanceOutcome;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NowPlaying {
    pub current_track_id: Option<DbId>,
    pub current_started_at: Option<Timestamp>,
    pub current_track: Option<Track>,
    pub playhead_seconds: i64,
}

/// GET /api/v1/station
///
/// What is on air. Never writes.
pub async fn now_playing(State(state): State<AppState>) -> AppResult<Json<DataResponse<NowPlaying>>> {
    let (snapshot, playhead_seconds) = state.scheduler.now_playing().await?;
    Ok(Json(DataResponse::new(NowPlaying {
        current_track_id: snapshot.state.current_track_id,
        current_started_at: snapshot.state.current_started_at,
        current_track: snapshot.current,
        playhead_seconds,
    })))
}

/// POST /api/v1/station/advance
///
/// Safe to call as often as clients like; a no-op while a track is playing.
pub async fn advance(State(state): State<AppState>) -> AppResult<Json<DataResponse<AdvanceOutcome>>> {
    let outcome = state.scheduler.advance().await?;
    Ok(Json(DataResponse::new(outcome)))
}
