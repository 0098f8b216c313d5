use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use station_core::clock::{Clock, ManualClock};
use station_core::track_status::{TrackSource, TrackStatus};
use station_core::types::{DbId, Timestamp};
use station_db::models::station::StationState;
use station_db::models::track::Track;
use station_scheduler::store::memory::sample_track;
use station_scheduler::store::StationSnapshot;
use station_scheduler::{
    InMemoryTrackStore, Notifier, NotifyError, SchedulerError, StationScheduler, StationUpdate,
    StoreError, TrackAdvance, TrackStore,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingNotifier {
    updates: Mutex<Vec<StationUpdate>>,
    advances: Mutex<Vec<TrackAdvance>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn station_update(&self, update: &StationUpdate) -> Result<(), NotifyError> {
        self.updates.lock().unwrap().push(update.clone());
        Ok(())
    }

    async fn track_advance(&self, advance: &TrackAdvance) -> Result<(), NotifyError> {
        self.advances.lock().unwrap().push(advance.clone());
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn station_update(&self, _: &StationUpdate) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("socket closed".into()))
    }

    async fn track_advance(&self, _: &TrackAdvance) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("socket closed".into()))
    }
}

fn epoch() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

struct Harness {
    store: Arc<InMemoryTrackStore>,
    clock: Arc<ManualClock>,
    notifier: Arc<RecordingNotifier>,
    scheduler: StationScheduler,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryTrackStore::new());
    let clock = Arc::new(ManualClock::new(epoch()));
    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler = StationScheduler::new(store.clone(), notifier.clone(), clock.clone());
    Harness {
        store,
        clock,
        notifier,
        scheduler,
    }
}

// ---------------------------------------------------------------------------
// Fresh tracks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn idle_station_plays_oldest_ready_track() {
    let h = harness();
    h.store.insert(sample_track(1, TrackStatus::Ready, epoch() - Duration::seconds(20))).await;
    h.store.insert(sample_track(2, TrackStatus::Ready, epoch() - Duration::seconds(10))).await;

    let outcome = h.scheduler.advance().await.unwrap();

    assert!(outcome.advanced);
    assert_eq!(outcome.playhead_seconds, 0);
    assert!(outcome.replay_created.is_none());
    let current = outcome.current_track.unwrap();
    assert_eq!(current.id, 1);
    assert_eq!(current.status(), Some(TrackStatus::Playing));
    assert_eq!(current.started_at, Some(epoch()));

    let (snapshot, playhead) = h.scheduler.now_playing().await.unwrap();
    assert_eq!(snapshot.state.current_track_id, Some(1));
    assert_eq!(snapshot.state.current_started_at, Some(epoch()));
    assert_eq!(playhead, 0);
    assert_eq!(h.store.track(2).await.unwrap().status(), Some(TrackStatus::Ready));
}

#[tokio::test]
async fn advance_mid_playback_is_a_no_op_without_writes() {
    let h = harness();
    h.store.insert(sample_track(1, TrackStatus::Ready, epoch() - Duration::seconds(20))).await;
    h.store.insert(sample_track(2, TrackStatus::Ready, epoch() - Duration::seconds(10))).await;
    h.scheduler.advance().await.unwrap();

    h.clock.advance(Duration::seconds(30));
    let first = h.scheduler.advance().await.unwrap();
    let writes = h.store.write_count().await;
    let second = h.scheduler.advance().await.unwrap();

    for outcome in [&first, &second] {
        assert!(!outcome.advanced);
        assert_eq!(outcome.playhead_seconds, 30);
        assert_eq!(outcome.current_track.as_ref().unwrap().id, 1);
    }
    assert_eq!(h.store.write_count().await, writes);
    assert_eq!(h.notifier.updates.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn finished_track_is_marked_done_and_next_starts_at_zero() {
    let h = harness();
    h.store.insert(sample_track(1, TrackStatus::Ready, epoch() - Duration::seconds(20))).await;
    h.store.insert(sample_track(2, TrackStatus::Ready, epoch() - Duration::seconds(10))).await;
    h.scheduler.advance().await.unwrap();

    h.clock.advance(Duration::seconds(65));
    let outcome = h.scheduler.advance().await.unwrap();

    assert!(outcome.advanced);
    assert_eq!(outcome.playhead_seconds, 0);
    let current = outcome.current_track.unwrap();
    assert_eq!(current.id, 2);
    assert_eq!(current.started_at, Some(h.clock.now()));

    let finished = h.store.track(1).await.unwrap();
    assert_eq!(finished.status(), Some(TrackStatus::Done));
    assert_eq!(finished.last_played_at, Some(epoch() + Duration::seconds(65)));
    assert_eq!(finished.finished_at, Some(epoch() + Duration::seconds(65)));

    let advances = h.notifier.advances.lock().unwrap();
    let last = advances.last().unwrap();
    assert_eq!(last.previous_track_id, Some(1));
    assert_eq!(last.new_track.as_ref().unwrap().id, 2);
    assert_eq!(last.playhead_seconds, 0);
}

// ---------------------------------------------------------------------------
// Replays
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lone_done_track_is_replayed_as_free_unrated_copy() {
    let h = harness();
    let mut source = sample_track(1, TrackStatus::Done, epoch() - Duration::days(2));
    source.price_cents = 300;
    source.last_played_at = Some(epoch() - Duration::hours(25));
    h.store.insert(source).await;

    let outcome = h.scheduler.advance().await.unwrap();

    assert!(outcome.advanced);
    let replay = outcome.replay_created.unwrap();
    assert_eq!(replay.source(), Some(TrackSource::Replay));
    assert_eq!(replay.price_cents, 0);
    assert_eq!(replay.rating_count, 0);
    assert_eq!(replay.replay_of_track_id, Some(1));

    let current = outcome.current_track.unwrap();
    assert_eq!(current.id, replay.id);
    assert_eq!(current.status(), Some(TrackStatus::Playing));

    let source = h.store.track(1).await.unwrap();
    assert_eq!(source.status(), Some(TrackStatus::Done));
    assert_eq!(source.last_played_at, Some(epoch()));
}

#[tokio::test]
async fn ready_track_always_beats_replay_candidates() {
    let h = harness();
    let mut loved = sample_track(1, TrackStatus::Done, epoch() - Duration::days(3));
    loved.rating_score = 1.0;
    loved.rating_count = 50;
    h.store.insert(loved).await;
    h.store.insert(sample_track(2, TrackStatus::Ready, epoch() - Duration::seconds(1))).await;

    let outcome = h.scheduler.advance().await.unwrap();

    assert_eq!(outcome.current_track.unwrap().id, 2);
    assert!(outcome.replay_created.is_none());
}

#[tokio::test]
async fn replay_picks_highest_scoring_done_track() {
    let h = harness();
    let mut disliked = sample_track(1, TrackStatus::Done, epoch() - Duration::days(1));
    disliked.rating_score = -0.5;
    disliked.last_played_at = Some(epoch() - Duration::hours(1));
    let mut liked = sample_track(2, TrackStatus::Done, epoch() - Duration::days(1));
    liked.rating_score = 0.8;
    liked.last_played_at = Some(epoch() - Duration::hours(1));
    h.store.insert(disliked).await;
    h.store.insert(liked).await;

    let outcome = h.scheduler.advance().await.unwrap();

    assert_eq!(outcome.replay_created.unwrap().replay_of_track_id, Some(2));
}

// ---------------------------------------------------------------------------
// Eligibility and empty pools
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tracks_with_foreign_artifacts_are_never_chosen() {
    let h = harness();
    let mut broken = sample_track(1, TrackStatus::Ready, epoch() - Duration::seconds(30));
    broken.audio_url = Some("/audio/2.mp3".into());
    let mut missing = sample_track(3, TrackStatus::Done, epoch() - Duration::days(1));
    missing.audio_url = None;
    h.store.insert(broken).await;
    h.store.insert(sample_track(2, TrackStatus::Ready, epoch() - Duration::seconds(10))).await;
    h.store.insert(missing).await;

    let outcome = h.scheduler.advance().await.unwrap();
    assert_eq!(outcome.current_track.unwrap().id, 2);

    h.clock.advance(Duration::seconds(61));
    let outcome = h.scheduler.advance().await.unwrap();
    // Track 2 is now the only eligible DONE source.
    assert_eq!(outcome.replay_created.unwrap().replay_of_track_id, Some(2));
}

#[tokio::test]
async fn nothing_eligible_clears_the_station() {
    let h = harness();
    let mut playing = sample_track(1, TrackStatus::Playing, epoch() - Duration::minutes(5));
    playing.audio_url = Some("/audio/not-mine.mp3".into());
    h.store.insert(playing).await;
    h.store
        .set_station(Some(1), Some(epoch() - Duration::seconds(90)))
        .await;

    let outcome = h.scheduler.advance().await.unwrap();

    assert!(outcome.advanced);
    assert!(outcome.current_track.is_none());
    assert_eq!(outcome.playhead_seconds, 0);
    let (snapshot, _) = h.scheduler.now_playing().await.unwrap();
    assert!(snapshot.state.is_idle());
    assert!(snapshot.state.current_started_at.is_none());
    assert_eq!(h.store.track(1).await.unwrap().status(), Some(TrackStatus::Done));

    let updates = h.notifier.updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    assert!(updates[0].current_track_id.is_none());
}

#[tokio::test]
async fn empty_store_reports_silence() {
    let h = harness();
    let outcome = h.scheduler.advance().await.unwrap();
    assert!(outcome.advanced);
    assert!(outcome.current_track.is_none());
}

// ---------------------------------------------------------------------------
// Failure handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn notification_failures_do_not_reach_the_caller() {
    let store = Arc::new(InMemoryTrackStore::new());
    store.insert(sample_track(1, TrackStatus::Ready, epoch())).await;
    let scheduler = StationScheduler::new(
        store.clone(),
        Arc::new(FailingNotifier),
        Arc::new(ManualClock::new(epoch())),
    );

    let outcome = scheduler.advance().await.unwrap();
    assert!(outcome.advanced);
    assert_eq!(store.track(1).await.unwrap().status(), Some(TrackStatus::Playing));
}

#[tokio::test]
async fn store_outage_is_fatal_for_the_call() {
    let h = harness();
    h.store.set_unavailable(true).await;
    assert_matches!(
        h.scheduler.advance().await,
        Err(SchedulerError::Store(StoreError::Unavailable(_)))
    );
}

#[tokio::test]
async fn station_left_on_a_done_track_recovers() {
    let h = harness();
    h.store.insert(sample_track(1, TrackStatus::Done, epoch() - Duration::hours(2))).await;
    h.store.insert(sample_track(2, TrackStatus::Ready, epoch() - Duration::hours(1))).await;
    h.store
        .set_station(Some(1), Some(epoch() - Duration::minutes(2)))
        .await;

    let outcome = h.scheduler.advance().await.unwrap();

    assert!(outcome.advanced);
    assert_eq!(outcome.current_track.unwrap().id, 2);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_advances_put_exactly_one_track_on_air() {
    let h = harness();
    for id in 1..=3 {
        h.store
            .insert(sample_track(id, TrackStatus::Ready, epoch() + Duration::seconds(id)))
            .await;
    }
    let scheduler = Arc::new(h.scheduler.clone());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.advance().await })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        if outcome.advanced {
            winners += 1;
        }
        assert_eq!(outcome.current_track.unwrap().id, 1);
    }
    assert_eq!(winners, 1);

    let playing = h
        .store
        .tracks()
        .await
        .into_iter()
        .filter(|t| t.status() == Some(TrackStatus::Playing))
        .count();
    assert_eq!(playing, 1);
}

#[tokio::test]
async fn concurrent_replays_put_exactly_one_row_on_air() {
    let h = harness();
    let mut a = sample_track(1, TrackStatus::Done, epoch() - Duration::days(2));
    a.last_played_at = Some(epoch() - Duration::hours(30));
    let mut b = sample_track(2, TrackStatus::Done, epoch() - Duration::days(1));
    b.last_played_at = Some(epoch() - Duration::hours(2));
    h.store.insert(a).await;
    h.store.insert(b).await;
    let scheduler = Arc::new(h.scheduler.clone());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.advance().await })
        })
        .collect();

    let mut winners = Vec::new();
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        if outcome.advanced {
            winners.push(outcome);
        } else {
            assert!(outcome.replay_created.is_none());
        }
    }
    assert_eq!(winners.len(), 1);
    let replay = winners[0].replay_created.clone().unwrap();
    assert_eq!(replay.replay_of_track_id, Some(1));
    assert_eq!(winners[0].current_track.as_ref().unwrap().id, replay.id);

    let tracks = h.store.tracks().await;
    assert_eq!(tracks.len(), 3);
    assert!(tracks.iter().all(|t| t.status() != Some(TrackStatus::Ready)));
    let (snapshot, _) = h.scheduler.now_playing().await.unwrap();
    assert_eq!(snapshot.state.current_track_id, Some(replay.id));
}

/// Lets a rival advance run to completion just before the first replay
/// write, so the caller's view of the station is stale when it arrives.
struct RivalBeforeReplay {
    inner: Arc<InMemoryTrackStore>,
    rival: StationScheduler,
    fired: AtomicBool,
}

#[async_trait]
impl TrackStore for RivalBeforeReplay {
    async fn station_snapshot(&self) -> Result<StationSnapshot, StoreError> {
        self.inner.station_snapshot().await
    }

    async fn mark_done(&self, track_id: DbId, now: Timestamp) -> Result<Option<Track>, StoreError> {
        self.inner.mark_done(track_id, now).await
    }

    async fn list_candidates(&self) -> Result<Vec<Track>, StoreError> {
        self.inner.list_candidates().await
    }

    async fn start_playback(
        &self,
        expected_current: Option<DbId>,
        track_id: DbId,
        now: Timestamp,
    ) -> Result<Option<StationSnapshot>, StoreError> {
        self.inner.start_playback(expected_current, track_id, now).await
    }

    async fn start_replay(
        &self,
        expected_current: Option<DbId>,
        source_id: DbId,
        now: Timestamp,
    ) -> Result<Option<StationSnapshot>, StoreError> {
        if !self.fired.swap(true, Ordering::SeqCst) {
            let rival = self.rival.advance().await.unwrap();
            assert!(rival.advanced);
        }
        self.inner.start_replay(expected_current, source_id, now).await
    }

    async fn clear_station(
        &self,
        expected_current: Option<DbId>,
    ) -> Result<Option<StationState>, StoreError> {
        self.inner.clear_station(expected_current).await
    }

    async fn claim_next_paid(&self) -> Result<Option<Track>, StoreError> {
        self.inner.claim_next_paid().await
    }

    async fn claim_paid_by_id(&self, track_id: DbId) -> Result<Option<Track>, StoreError> {
        self.inner.claim_paid_by_id(track_id).await
    }

    async fn mark_ready(
        &self,
        track_id: DbId,
        audio_url: &str,
        provider_request_id: Option<&str>,
    ) -> Result<Option<Track>, StoreError> {
        self.inner.mark_ready(track_id, audio_url, provider_request_id).await
    }

    async fn mark_failed(&self, track_id: DbId, reason: &str) -> Result<Option<Track>, StoreError> {
        self.inner.mark_failed(track_id, reason).await
    }
}

#[tokio::test]
async fn losing_replay_race_leaves_no_stranded_row() {
    let h = harness();
    h.store
        .insert(sample_track(1, TrackStatus::Done, epoch() - Duration::days(1)))
        .await;
    let racing = Arc::new(RivalBeforeReplay {
        inner: h.store.clone(),
        rival: h.scheduler.clone(),
        fired: AtomicBool::new(false),
    });
    let loser = StationScheduler::new(racing, h.notifier.clone(), h.clock.clone());

    let outcome = loser.advance().await.unwrap();

    assert!(!outcome.advanced);
    assert!(outcome.replay_created.is_none());
    let winner = outcome.current_track.unwrap();
    assert_eq!(winner.replay_of_track_id, Some(1));
    assert_eq!(h.store.tracks().await.len(), 2);

    // Later advances keep replaying the original; nothing is left waiting.
    for _ in 0..3 {
        h.clock.advance(Duration::seconds(61));
        let outcome = loser.advance().await.unwrap();
        assert!(outcome.advanced);
        assert_eq!(outcome.replay_created.unwrap().replay_of_track_id, Some(1));
    }
    let tracks = h.store.tracks().await;
    assert_eq!(tracks.len(), 5);
    assert!(tracks.iter().all(|t| t.status() != Some(TrackStatus::Ready)));
}

#[tokio::test]
async fn store_trait_object_is_usable_directly() {
    let h = harness();
    let store: Arc<dyn TrackStore> = h.store.clone();
    let snapshot = store.station_snapshot().await.unwrap();
    assert!(snapshot.current.is_none());
}
