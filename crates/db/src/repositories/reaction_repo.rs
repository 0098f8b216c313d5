//! Repository for `track_reactions` and the rating aggregate on `tracks`.

use sqlx::PgPool;
use station_core::rating;
use station_core::types::DbId;

use crate::models::reaction::TrackReaction;
use crate::models::track::Track;
use crate::repositories::track_repo::COLUMNS as TRACK_COLUMNS;

const COLUMNS: &str = "id, track_id, listener, value, created_at, updated_at";

pub struct ReactionRepo;

impl ReactionRepo {
    /// Record (or change) a listener's reaction and recompute the track's
    /// `rating_score` / `rating_count` in the same transaction.
    ///
    /// Returns `None` if the track does not exist.
    pub async fn react(
        pool: &PgPool,
        track_id: DbId,
        listener: &str,
        value: i16,
    ) -> Result<Option<Track>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // Serialises concurrent reactions to the same track.
        let exists = sqlx::query_scalar::<_, DbId>("SELECT id FROM tracks WHERE id = $1 FOR UPDATE")
            .bind(track_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query(
            "INSERT INTO track_reactions (track_id, listener, value) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (track_id, listener) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(track_id)
        .bind(listener)
        .bind(value)
        .execute(&mut *tx)
        .await?;

        let (sum, count): (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(value), 0)::BIGINT, COUNT(*) \
             FROM track_reactions WHERE track_id = $1",
        )
        .bind(track_id)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!(
            "UPDATE tracks SET rating_score = $2, rating_count = $3 \
             WHERE id = $1 \
             RETURNING {TRACK_COLUMNS}"
        );
        let track = sqlx::query_as::<_, Track>(&query)
            .bind(track_id)
            .bind(rating::aggregate(sum, count))
            .bind(i32::try_from(count).unwrap_or(i32::MAX))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(track))
    }

    /// All reactions for a track, newest first.
    pub async fn list_for_track(
        pool: &PgPool,
        track_id: DbId,
    ) -> Result<Vec<TrackReaction>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM track_reactions \
             WHERE track_id = $1 \
             ORDER BY updated_at DESC, id DESC"
        );
        sqlx::query_as::<_, TrackReaction>(&query)
            .bind(track_id)
            .fetch_all(pool)
            .await
    }
}
