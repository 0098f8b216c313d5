//! Repository for the `tracks` table.
//!
//! Every status write names the status it moves *from* in its `WHERE`
//! clause, so a write that races another role simply affects zero rows and
//! returns `None`.

use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use station_core::payment::PaymentProof;
use station_core::track_status::{TrackSource, TrackStatus};
use station_core::types::{DbId, Timestamp};

use crate::models::track::{SubmitTrack, Track};

/// Column list for `tracks` queries.
pub(crate) const COLUMNS: &str = "\
    id, user_id, prompt, duration_secs, source_id, status_id, price_cents, \
    payment_proof, provider_request_id, audio_url, failure_reason, \
    rating_score, rating_count, replay_of_track_id, \
    claimed_at, started_at, finished_at, last_played_at, \
    created_at, updated_at";

/// Maximum number of rows returned by the queue listing.
const MAX_QUEUE_LIMIT: i64 = 200;

/// Provides lifecycle operations for tracks.
pub struct TrackRepo;

impl TrackRepo {
    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Insert a freshly submitted track in `PENDING_PAYMENT`.
    pub async fn submit(pool: &PgPool, input: &SubmitTrack) -> Result<Track, sqlx::Error> {
        let query = format!(
            "INSERT INTO tracks (user_id, prompt, duration_secs, source_id, status_id, price_cents) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Track>(&query)
            .bind(input.user_id)
            .bind(&input.prompt)
            .bind(input.duration_secs)
            .bind(TrackSource::Generated.id())
            .bind(TrackStatus::PendingPayment.id())
            .bind(input.price_cents.unwrap_or(0))
            .fetch_one(pool)
            .await
    }

    /// Insert a `READY` replay row cloned from a `DONE` source track.
    ///
    /// Runs on the caller's connection so it can share the station lock taken
    /// by [`StationRepo::start_replay`](crate::repositories::StationRepo::start_replay).
    /// The new row is free, unrated, and points back at its source. The
    /// source's `last_played_at` is stamped with `now` so its recency bonus
    /// restarts. Returns `None` if the source is no longer `DONE`.
    pub(crate) async fn insert_replay(
        conn: &mut PgConnection,
        source_id: DbId,
        now: Timestamp,
    ) -> Result<Option<Track>, sqlx::Error> {
        let touched = sqlx::query(
            "UPDATE tracks SET last_played_at = $2 WHERE id = $1 AND status_id = $3",
        )
        .bind(source_id)
        .bind(now)
        .bind(TrackStatus::Done.id())
        .execute(&mut *conn)
        .await?;

        if touched.rows_affected() == 0 {
            tracing::debug!(source_id, "Replay source is no longer DONE");
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO tracks \
                 (user_id, prompt, duration_secs, source_id, status_id, price_cents, \
                  provider_request_id, audio_url, rating_score, rating_count, replay_of_track_id, \
                  created_at) \
             SELECT user_id, prompt, duration_secs, $2, $3, 0, \
                    provider_request_id, audio_url, 0, 0, id, $4 \
             FROM tracks WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let replay = sqlx::query_as::<_, Track>(&query)
            .bind(source_id)
            .bind(TrackSource::Replay.id())
            .bind(TrackStatus::Ready.id())
            .bind(now)
            .fetch_one(&mut *conn)
            .await?;
        Ok(Some(replay))
    }

    // -----------------------------------------------------------------------
    // Payment collaborator
    // -----------------------------------------------------------------------

    /// `PENDING_PAYMENT -> PAID`, recording the proof.
    pub async fn mark_paid(
        pool: &PgPool,
        id: DbId,
        proof: &PaymentProof,
    ) -> Result<Option<Track>, sqlx::Error> {
        let query = format!(
            "UPDATE tracks SET status_id = $2, payment_proof = $3 \
             WHERE id = $1 AND status_id = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Track>(&query)
            .bind(id)
            .bind(TrackStatus::Paid.id())
            .bind(Json(proof))
            .bind(TrackStatus::PendingPayment.id())
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Generation claim
    // -----------------------------------------------------------------------

    /// Atomically claim the oldest `PAID` track and move it to `GENERATING`.
    ///
    /// Uses `SELECT FOR UPDATE SKIP LOCKED` so concurrent workers never
    /// receive the same row. Rows locked by another claimant are skipped,
    /// not waited on.
    pub async fn claim_next_paid(pool: &PgPool) -> Result<Option<Track>, sqlx::Error> {
        let query = format!(
            "UPDATE tracks \
             SET status_id = $1, claimed_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM tracks \
                 WHERE status_id = $2 \
                 ORDER BY created_at ASC, id ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Track>(&query)
            .bind(TrackStatus::Generating.id())
            .bind(TrackStatus::Paid.id())
            .fetch_optional(pool)
            .await
    }

    /// Claim one specific track, only if it is still `PAID` and unlocked.
    pub async fn claim_paid_by_id(pool: &PgPool, id: DbId) -> Result<Option<Track>, sqlx::Error> {
        let query = format!(
            "UPDATE tracks \
             SET status_id = $2, claimed_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM tracks \
                 WHERE id = $1 AND status_id = $3 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Track>(&query)
            .bind(id)
            .bind(TrackStatus::Generating.id())
            .bind(TrackStatus::Paid.id())
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Generation results
    // -----------------------------------------------------------------------

    /// `GENERATING -> READY` with the artifact reference.
    pub async fn mark_ready(
        pool: &PgPool,
        id: DbId,
        audio_url: &str,
        provider_request_id: Option<&str>,
    ) -> Result<Option<Track>, sqlx::Error> {
        let query = format!(
            "UPDATE tracks \
             SET status_id = $2, audio_url = $3, \
                 provider_request_id = COALESCE($4, provider_request_id) \
             WHERE id = $1 AND status_id = $5 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Track>(&query)
            .bind(id)
            .bind(TrackStatus::Ready.id())
            .bind(audio_url)
            .bind(provider_request_id)
            .bind(TrackStatus::Generating.id())
            .fetch_optional(pool)
            .await
    }

    /// `GENERATING -> FAILED` with a reason.
    pub async fn mark_failed(
        pool: &PgPool,
        id: DbId,
        reason: &str,
    ) -> Result<Option<Track>, sqlx::Error> {
        let query = format!(
            "UPDATE tracks \
             SET status_id = $2, failure_reason = $3, finished_at = NOW() \
             WHERE id = $1 AND status_id = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Track>(&query)
            .bind(id)
            .bind(TrackStatus::Failed.id())
            .bind(reason)
            .bind(TrackStatus::Generating.id())
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Playback
    // -----------------------------------------------------------------------

    /// `PLAYING -> DONE`, stamping `finished_at` and `last_played_at`.
    ///
    /// A track already `DONE` is left alone and `None` is returned, which
    /// makes repeated calls harmless.
    pub async fn mark_done(
        pool: &PgPool,
        id: DbId,
        now: Timestamp,
    ) -> Result<Option<Track>, sqlx::Error> {
        let query = format!(
            "UPDATE tracks \
             SET status_id = $2, finished_at = $3, last_played_at = $3 \
             WHERE id = $1 AND status_id = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Track>(&query)
            .bind(id)
            .bind(TrackStatus::Done.id())
            .bind(now)
            .bind(TrackStatus::Playing.id())
            .fetch_optional(pool)
            .await
    }

    /// `DONE -> ARCHIVED`. Archived tracks leave the replay pool for good.
    pub async fn archive(pool: &PgPool, id: DbId) -> Result<Option<Track>, sqlx::Error> {
        let query = format!(
            "UPDATE tracks SET status_id = $2 \
             WHERE id = $1 AND status_id = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Track>(&query)
            .bind(id)
            .bind(TrackStatus::Archived.id())
            .bind(TrackStatus::Done.id())
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Find a track by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Track>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tracks WHERE id = $1");
        sqlx::query_as::<_, Track>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Rows the scheduler may pick from, oldest first: every `READY` track
    /// and every `DONE` original. Played replays are left out; they share
    /// their source's artifact and can never be selected again.
    pub async fn list_candidates(pool: &PgPool) -> Result<Vec<Track>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tracks \
             WHERE status_id = $1 \
                OR (status_id = $2 AND replay_of_track_id IS NULL) \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Track>(&query)
            .bind(TrackStatus::Ready.id())
            .bind(TrackStatus::Done.id())
            .fetch_all(pool)
            .await
    }

    /// Upcoming `READY` tracks in play order.
    pub async fn list_queue(pool: &PgPool, limit: Option<i64>) -> Result<Vec<Track>, sqlx::Error> {
        let limit = limit.unwrap_or(MAX_QUEUE_LIMIT).clamp(1, MAX_QUEUE_LIMIT);
        let query = format!(
            "SELECT {COLUMNS} FROM tracks \
             WHERE status_id = $1 \
             ORDER BY created_at ASC, id ASC \
             LIMIT $2"
        );
        sqlx::query_as::<_, Track>(&query)
            .bind(TrackStatus::Ready.id())
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
