use std::path::PathBuf;
use std::time::Duration;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    /// How often to look for newly paid tracks.
    pub poll_interval: Duration,
    /// Directory audio files are written to.
    pub artifact_dir: PathBuf,
    /// Public prefix the API serves `artifact_dir` under.
    pub artifact_base_url: String,
    /// Audio provider endpoint. Receives a JSON request, answers with audio bytes.
    pub generation_endpoint: String,
    pub generation_timeout: Duration,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                   | Default                       |
    /// |---------------------------|-------------------------------|
    /// | `DATABASE_URL`            | required                      |
    /// | `WORKER_POLL_INTERVAL_MS` | `2000`                        |
    /// | `ARTIFACT_DIR`            | `./artifacts`                 |
    /// | `ARTIFACT_BASE_URL`       | `http://localhost:3000/audio` |
    /// | `GENERATION_ENDPOINT`     | required                      |
    /// | `GENERATION_TIMEOUT_SECS` | `180`                         |
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let poll_interval_ms: u64 = std::env::var("WORKER_POLL_INTERVAL_MS")
            .unwrap_or_else(|_| "2000".into())
            .parse()
            .expect("WORKER_POLL_INTERVAL_MS must be a valid u64");

        let artifact_dir = std::env::var("ARTIFACT_DIR").unwrap_or_else(|_| "./artifacts".into());

        let artifact_base_url = std::env::var("ARTIFACT_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000/audio".into());

        let generation_endpoint =
            std::env::var("GENERATION_ENDPOINT").expect("GENERATION_ENDPOINT must be set");

        let generation_timeout_secs: u64 = std::env::var("GENERATION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "180".into())
            .parse()
            .expect("GENERATION_TIMEOUT_SECS must be a valid u64");

        Self {
            database_url,
            poll_interval: Duration::from_millis(poll_interval_ms),
            artifact_dir: PathBuf::from(artifact_dir),
            artifact_base_url,
            generation_endpoint,
            generation_timeout: Duration::from_secs(generation_timeout_secs),
        }
    }
}
