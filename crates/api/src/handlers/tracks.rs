//! Handlers for `/tracks`.
//!
//! Submission and payment belong to listeners, claim/ready/fail to the
//! generation worker, archive to operators. Every status write is
//! conditional; a write that finds the track in the wrong status answers
//! 409 with the status it found.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use station_core::error::CoreError;
use station_core::payment::PaymentProof;
use station_core::types::DbId;
use station_core::{rating, submission};
use station_db::models::reaction::CreateReaction;
use station_db::models::track::{MarkFailed, MarkReady, SubmitTrack, Track};
use station_db::repositories::{ReactionRepo, TrackRepo};
use station_db::DbPool;
use station_events::bus::QUEUE_UPDATE;
use station_events::StationEvent;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueueQuery {
    pub limit: Option<i64>,
}

/// POST /api/v1/tracks
pub async fn submit(
    State(state): State<AppState>,
    Json(input): Json<SubmitTrack>,
) -> AppResult<(StatusCode, Json<DataResponse<Track>>)> {
    submission::validate_prompt(&input.prompt)?;
    submission::validate_duration(input.duration_secs)?;
    if let Some(price) = input.price_cents {
        submission::validate_price(price)?;
    }

    let track = TrackRepo::submit(&state.pool, &input).await?;
    tracing::info!(track_id = track.id, "Track submitted");
    Ok((StatusCode::CREATED, Json(DataResponse::new(track))))
}

/// GET /api/v1/tracks/queue
pub async fn queue(
    State(state): State<AppState>,
    Query(params): Query<QueueQuery>,
) -> AppResult<Json<DataResponse<Vec<Track>>>> {
    let tracks = TrackRepo::list_queue(&state.pool, params.limit).await?;
    Ok(Json(DataResponse::new(tracks)))
}

/// GET /api/v1/tracks/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Track>>> {
    let track = TrackRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "Track", id })?;
    Ok(Json(DataResponse::new(track)))
}

/// POST /api/v1/tracks/{id}/payment
pub async fn record_payment(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(proof): Json<PaymentProof>,
) -> AppResult<Json<DataResponse<Track>>> {
    proof.validate()?;
    match TrackRepo::mark_paid(&state.pool, id, &proof).await? {
        Some(track) => {
            tracing::info!(track_id = id, settlement = proof.is_settlement(), "Payment recorded");
            Ok(Json(DataResponse::new(track)))
        }
        None => Err(status_conflict(&state.pool, id, "record payment for").await),
    }
}

/// POST /api/v1/tracks/claim
///
/// `data` is `null` when nothing is waiting.
pub async fn claim_next(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Option<Track>>>> {
    let claimed = state.generation.claim_next_paid().await?;
    Ok(Json(DataResponse::new(claimed)))
}

/// POST /api/v1/tracks/{id}/claim
pub async fn claim_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Option<Track>>>> {
    let claimed = state.generation.claim_paid_by_id(id).await?;
    Ok(Json(DataResponse::new(claimed)))
}

/// POST /api/v1/tracks/{id}/ready
pub async fn mark_ready(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<MarkReady>,
) -> AppResult<Json<DataResponse<Track>>> {
    if input.audio_url.trim().is_empty() {
        return Err(AppError::BadRequest("audio_url must not be empty".into()));
    }
    let track = state
        .generation
        .mark_ready(id, input.audio_url.trim(), input.provider_request_id.as_deref())
        .await?;

    match track {
        Some(track) => {
            state
                .event_bus
                .publish(StationEvent::new(QUEUE_UPDATE).with_track(Some(track.id)));
            Ok(Json(DataResponse::new(track)))
        }
        None => Err(status_conflict(&state.pool, id, "mark ready").await),
    }
}

/// POST /api/v1/tracks/{id}/fail
pub async fn mark_failed(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<MarkFailed>,
) -> AppResult<Json<DataResponse<Track>>> {
    let reason = input.reason.trim();
    if reason.is_empty() {
        return Err(AppError::BadRequest("reason must not be empty".into()));
    }
    match state.generation.mark_failed(id, reason).await? {
        Some(track) => Ok(Json(DataResponse::new(track))),
        None => Err(status_conflict(&state.pool, id, "mark failed").await),
    }
}

/// POST /api/v1/tracks/{id}/reactions
///
/// One reaction per listener per track; a second call replaces the first.
pub async fn react(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateReaction>,
) -> AppResult<Json<DataResponse<Track>>> {
    rating::validate_listener(&input.listener)?;
    rating::validate_reaction(input.value)?;

    let track = ReactionRepo::react(&state.pool, id, input.listener.trim(), input.value)
        .await?
        .ok_or(CoreError::NotFound { entity: "Track", id })?;
    Ok(Json(DataResponse::new(track)))
}

/// POST /api/v1/tracks/{id}/archive
pub async fn archive(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Track>>> {
    match TrackRepo::archive(&state.pool, id).await? {
        Some(track) => {
            tracing::info!(track_id = id, "Track archived");
            Ok(Json(DataResponse::new(track)))
        }
        None => Err(status_conflict(&state.pool, id, "archive").await),
    }
}

// ── Private helpers ──────────────────────────────────────────────────────

/// Explain why a conditional write matched nothing: missing row or wrong status.
async fn status_conflict(pool: &DbPool, id: DbId, action: &str) -> AppError {
    match TrackRepo::find_by_id(pool, id).await {
        Ok(Some(track)) => {
            let status = track
                .status()
                .map(|s| s.name())
                .unwrap_or("UNKNOWN");
            AppError::Core(CoreError::Conflict(format!(
                "Cannot {action} track {id} in status {status}"
            )))
        }
        Ok(None) => AppError::Core(CoreError::NotFound { entity: "Track", id }),
        Err(e) => AppError::Database(e),
    }
}
