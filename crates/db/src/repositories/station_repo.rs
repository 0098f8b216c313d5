//! Repository for the `station_state` singleton.
//!
//! Writes are compare-and-set against the `current_track_id` the caller read
//! earlier. If another advance got there first the write is discarded and
//! `None` comes back.

use sqlx::{PgConnection, PgPool};
use station_core::track_status::TrackStatus;
use station_core::types::{DbId, Timestamp};

use crate::models::station::StationState;
use crate::models::track::Track;
use crate::repositories::track_repo::{TrackRepo, COLUMNS as TRACK_COLUMNS};

/// Column list for `station_state` queries.
const COLUMNS: &str = "id, current_track_id, current_started_at, created_at, updated_at";

/// Reads and conditional writes of what is on air.
pub struct StationRepo;

impl StationRepo {
    /// Load the singleton row.
    pub async fn get(pool: &PgPool) -> Result<StationState, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM station_state WHERE id = $1");
        sqlx::query_as::<_, StationState>(&query)
            .bind(StationState::SINGLETON_ID)
            .fetch_one(pool)
            .await
    }

    /// Put `track_id` on air if the station still shows `expected_current`.
    ///
    /// In one transaction: lock the station row, verify it, move the track
    /// `READY -> PLAYING` with `started_at = now`, and point the station at it.
    /// Returns `None` (and writes nothing) when the station moved on or the
    /// track is no longer `READY`.
    pub async fn start_playback(
        pool: &PgPool,
        expected_current: Option<DbId>,
        track_id: DbId,
        now: Timestamp,
    ) -> Result<Option<(StationState, Track)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if !lock_if_current(&mut tx, expected_current).await? {
            tx.rollback().await?;
            return Ok(None);
        }

        let Some(track) = play(&mut tx, track_id, now).await? else {
            tracing::debug!(track_id, "Track no longer READY, discarding playback start");
            tx.rollback().await?;
            return Ok(None);
        };

        let state = point_at(&mut tx, track_id, now).await?;
        tx.commit().await?;
        Ok(Some((state, track)))
    }

    /// Replay `source_id` if the station still shows `expected_current`.
    ///
    /// Under the same station lock as [`start_playback`](Self::start_playback):
    /// create the replay row from the `DONE` source, move it straight to
    /// `PLAYING`, and point the station at it. A caller that loses the race
    /// gets `None` and leaves no replay row behind.
    pub async fn start_replay(
        pool: &PgPool,
        expected_current: Option<DbId>,
        source_id: DbId,
        now: Timestamp,
    ) -> Result<Option<(StationState, Track)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if !lock_if_current(&mut tx, expected_current).await? {
            tx.rollback().await?;
            return Ok(None);
        }

        let Some(replay) = TrackRepo::insert_replay(&mut tx, source_id, now).await? else {
            tx.rollback().await?;
            return Ok(None);
        };

        let Some(track) = play(&mut tx, replay.id, now).await? else {
            tx.rollback().await?;
            return Ok(None);
        };

        let state = point_at(&mut tx, replay.id, now).await?;
        tx.commit().await?;
        Ok(Some((state, track)))
    }

    /// Take the station off air if it still shows `expected_current`.
    pub async fn clear(
        pool: &PgPool,
        expected_current: Option<DbId>,
    ) -> Result<Option<StationState>, sqlx::Error> {
        let query = format!(
            "UPDATE station_state \
             SET current_track_id = NULL, current_started_at = NULL \
             WHERE id = $1 AND current_track_id IS NOT DISTINCT FROM $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StationState>(&query)
            .bind(StationState::SINGLETON_ID)
            .bind(expected_current)
            .fetch_optional(pool)
            .await
    }
}

/// Lock the station row. `false` if it no longer shows `expected_current`.
async fn lock_if_current(
    conn: &mut PgConnection,
    expected_current: Option<DbId>,
) -> Result<bool, sqlx::Error> {
    let lock = format!("SELECT {COLUMNS} FROM station_state WHERE id = $1 FOR UPDATE");
    let state = sqlx::query_as::<_, StationState>(&lock)
        .bind(StationState::SINGLETON_ID)
        .fetch_one(&mut *conn)
        .await?;

    if state.current_track_id != expected_current {
        tracing::debug!(
            expected = ?expected_current,
            actual = ?state.current_track_id,
            "Station moved on, discarding write"
        );
        return Ok(false);
    }
    Ok(true)
}

/// `READY -> PLAYING` with `started_at = now`.
async fn play(
    conn: &mut PgConnection,
    track_id: DbId,
    now: Timestamp,
) -> Result<Option<Track>, sqlx::Error> {
    let query = format!(
        "UPDATE tracks SET status_id = $2, started_at = $3 \
         WHERE id = $1 AND status_id = $4 \
         RETURNING {TRACK_COLUMNS}"
    );
    sqlx::query_as::<_, Track>(&query)
        .bind(track_id)
        .bind(TrackStatus::Playing.id())
        .bind(now)
        .bind(TrackStatus::Ready.id())
        .fetch_optional(&mut *conn)
        .await
}

async fn point_at(
    conn: &mut PgConnection,
    track_id: DbId,
    now: Timestamp,
) -> Result<StationState, sqlx::Error> {
    let query = format!(
        "UPDATE station_state \
         SET current_track_id = $2, current_started_at = $3 \
         WHERE id = $1 \
         RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, StationState>(&query)
        .bind(StationState::SINGLETON_ID)
        .bind(track_id)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
}
