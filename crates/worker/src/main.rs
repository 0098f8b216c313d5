use std::sync::Arc;

use station_core::clock::SystemClock;
use station_scheduler::{GenerationClaim, PgTrackStore, StationScheduler, TracingNotifier};
use station_worker::{GenerationWorker, HttpAudioProvider, LocalArtifactStore, WorkerConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "station_worker=debug,station_scheduler=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env();
    tracing::info!(
        endpoint = %config.generation_endpoint,
        artifact_dir = %config.artifact_dir.display(),
        "Loaded worker configuration"
    );

    let pool = station_db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    station_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database connection pool created");

    let store = Arc::new(PgTrackStore::new(pool));
    // Listeners of the API process hear about the change on their next poll.
    let scheduler = StationScheduler::new(
        store.clone(),
        Arc::new(TracingNotifier),
        Arc::new(SystemClock),
    );
    let provider = HttpAudioProvider::new(&config.generation_endpoint, config.generation_timeout)
        .expect("Failed to build HTTP client");
    let artifacts = LocalArtifactStore::new(&config.artifact_dir, &config.artifact_base_url);

    let worker = GenerationWorker::new(
        GenerationClaim::new(store),
        scheduler,
        Arc::new(provider),
        Arc::new(artifacts),
    )
    .with_poll_interval(config.poll_interval);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received SIGINT (Ctrl-C), stopping worker");
        }
        signal_cancel.cancel();
    });

    worker.run(cancel).await;
    tracing::info!("Worker stopped");
}
