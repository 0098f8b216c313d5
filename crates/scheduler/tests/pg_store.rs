use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use station_core::clock::ManualClock;
use station_core::track_status::{TrackSource, TrackStatus};
use station_core::types::DbId;
use station_scheduler::{PgTrackStore, StationScheduler, TracingNotifier};

/// Insert a generated track in `status` whose artifact matches its id.
async fn seed(pool: &PgPool, status: TrackStatus, age_secs: i64) -> DbId {
    let (id,): (DbId,) = sqlx::query_as(
        "INSERT INTO tracks (prompt, duration_secs, source_id, status_id, created_at) \
         VALUES ('seed', 60, $1, $2, NOW() - make_interval(secs => $3)) \
         RETURNING id",
    )
    .bind(TrackSource::Generated.id())
    .bind(status.id())
    .bind(age_secs as f64)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query("UPDATE tracks SET audio_url = '/audio/' || id || '.mp3' WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
    id
}

fn scheduler(pool: &PgPool, clock: Arc<ManualClock>) -> StationScheduler {
    StationScheduler::new(
        Arc::new(PgTrackStore::new(pool.clone())),
        Arc::new(TracingNotifier),
        clock,
    )
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn advance_plays_fifo_then_replays(pool: PgPool) {
    let first = seed(&pool, TrackStatus::Ready, 20).await;
    let second = seed(&pool, TrackStatus::Ready, 10).await;
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let scheduler = scheduler(&pool, clock.clone());

    let outcome = scheduler.advance().await.unwrap();
    assert_eq!(outcome.current_track.unwrap().id, first);

    clock.advance(Duration::seconds(61));
    let outcome = scheduler.advance().await.unwrap();
    assert_eq!(outcome.current_track.unwrap().id, second);

    clock.advance(Duration::seconds(61));
    let outcome = scheduler.advance().await.unwrap();
    let replay = outcome.replay_created.unwrap();
    assert!(replay.is_replay());
    assert_eq!(replay.price_cents, 0);
    assert!([first, second].contains(&replay.replay_of_track_id.unwrap()));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_advances_agree_on_one_track(pool: PgPool) {
    seed(&pool, TrackStatus::Ready, 30).await;
    seed(&pool, TrackStatus::Ready, 20).await;
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let a = scheduler(&pool, clock.clone());
    let b = scheduler(&pool, clock.clone());

    let (ra, rb) = tokio::join!(a.advance(), b.advance());
    let (ra, rb) = (ra.unwrap(), rb.unwrap());

    assert_eq!(
        ra.current_track.map(|t| t.id),
        rb.current_track.map(|t| t.id)
    );
    let playing: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tracks WHERE status_id = $1")
        .bind(TrackStatus::Playing.id())
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(playing.0, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_replays_leave_no_ready_rows(pool: PgPool) {
    let source = seed(&pool, TrackStatus::Done, 3600).await;
    let clock = Arc::new(ManualClock::new(Utc::now()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let scheduler = scheduler(&pool, clock.clone());
            tokio::spawn(async move { scheduler.advance().await })
        })
        .collect();

    let mut replays = Vec::new();
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome.advanced, outcome.replay_created.is_some());
        if let Some(replay) = outcome.replay_created {
            assert_eq!(replay.replay_of_track_id, Some(source));
            assert_eq!(outcome.current_track.unwrap().id, replay.id);
            replays.push(replay.id);
        }
    }
    assert_eq!(replays.len(), 1);

    let (rows, ready): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE status_id = $1) FROM tracks",
    )
    .bind(TrackStatus::Ready.id())
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(rows, 2);
    assert_eq!(ready, 0);
}
