use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use station_core::clock::ManualClock;
use station_core::track_status::TrackStatus;
use station_scheduler::store::memory::sample_track;
use station_scheduler::{
    GenerationClaim, InMemoryTrackStore, StationScheduler, TrackStore, TracingNotifier,
};
use station_worker::{
    AudioProvider, GeneratedAudio, GenerationRequest, GenerationWorker, LocalArtifactStore,
    ProviderError,
};
use tokio_util::sync::CancellationToken;

struct FakeProvider {
    fail: bool,
    calls: AtomicUsize,
}

impl FakeProvider {
    fn new(fail: bool) -> Self {
        Self {
            fail,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AudioProvider for FakeProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedAudio, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::HttpStatus(502));
        }
        Ok(GeneratedAudio {
            bytes: format!("audio for {}", request.track_id).into_bytes(),
            provider_request_id: Some(format!("req-{}", request.track_id)),
        })
    }
}

struct Setup {
    store: Arc<InMemoryTrackStore>,
    provider: Arc<FakeProvider>,
    worker: GenerationWorker,
    _dir: tempfile::TempDir,
}

fn setup(fail: bool) -> Setup {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(InMemoryTrackStore::new());
    let dyn_store: Arc<dyn TrackStore> = store.clone();
    let provider = Arc::new(FakeProvider::new(fail));
    let scheduler = StationScheduler::new(
        dyn_store.clone(),
        Arc::new(TracingNotifier),
        Arc::new(ManualClock::new(Utc::now())),
    );
    let worker = GenerationWorker::new(
        GenerationClaim::new(dyn_store),
        scheduler,
        provider.clone(),
        Arc::new(LocalArtifactStore::new(dir.path(), "http://localhost:3000/audio")),
    )
    .with_poll_interval(Duration::from_millis(10));

    Setup {
        store,
        provider,
        worker,
        _dir: dir,
    }
}

fn paid(id: i64) -> station_db::models::track::Track {
    let mut track = sample_track(id, TrackStatus::Paid, Utc::now() - chrono::Duration::minutes(id));
    track.audio_url = None;
    track
}

#[tokio::test]
async fn successful_generation_goes_ready_and_on_air() {
    let s = setup(false);
    s.store.insert(paid(1)).await;

    let track = s.worker.run_once().await.unwrap().unwrap();

    assert_eq!(track.id, 1);
    assert_eq!(track.audio_url.as_deref(), Some("http://localhost:3000/audio/1.mp3"));
    assert_eq!(track.provider_request_id.as_deref(), Some("req-1"));

    // The idle station picked it up immediately.
    let stored = s.store.track(1).await.unwrap();
    assert_eq!(stored.status(), Some(TrackStatus::Playing));
    let snapshot = s.store.station_snapshot().await.unwrap();
    assert_eq!(snapshot.state.current_track_id, Some(1));
}

#[tokio::test]
async fn provider_failure_marks_track_failed() {
    let s = setup(true);
    s.store.insert(paid(1)).await;

    let track = s.worker.run_once().await.unwrap().unwrap();

    assert_eq!(track.status(), Some(TrackStatus::Failed));
    assert!(track.failure_reason.unwrap().contains("502"));
    assert!(s.store.station_snapshot().await.unwrap().state.is_idle());
}

#[tokio::test]
async fn nothing_to_claim_is_a_quiet_no_op() {
    let s = setup(false);
    assert!(s.worker.run_once().await.unwrap().is_none());
    assert_eq!(s.provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn run_drains_queue_and_stops_on_cancel() {
    let s = setup(false);
    for id in 1..=3 {
        s.store.insert(paid(id)).await;
    }
    let cancel = CancellationToken::new();

    let stopper = cancel.clone();
    let store = s.store.clone();
    let watcher = tokio::spawn(async move {
        loop {
            let pending = store
                .tracks()
                .await
                .iter()
                .filter(|t| t.status() == Some(TrackStatus::Paid))
                .count();
            if pending == 0 {
                stopper.cancel();
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    });

    tokio::time::timeout(Duration::from_secs(5), s.worker.run(cancel))
        .await
        .expect("worker should stop after cancel");
    watcher.await.unwrap();

    assert_eq!(s.provider.calls.load(Ordering::SeqCst), 3);
    let statuses: Vec<_> = s.store.tracks().await.iter().map(|t| t.status()).collect();
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == Some(TrackStatus::Playing))
            .count(),
        1
    );
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == Some(TrackStatus::Ready))
            .count(),
        2
    );
}
