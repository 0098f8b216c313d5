//! Where generated audio is kept.

use std::path::PathBuf;

use async_trait::async_trait;
use station_core::eligibility::artifact_file_name;
use station_core::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist audio for `track_id` and return the reference to record on the track.
    async fn store(&self, track_id: DbId, audio: &[u8]) -> Result<String, ArtifactError>;
}

/// Files in a local directory, published under `base_url`.
pub struct LocalArtifactStore {
    dir: PathBuf,
    base_url: String,
}

impl LocalArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.into(),
        }
    }

    fn url_for(&self, file_name: &str) -> String {
        format!("{}/{file_name}", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn store(&self, track_id: DbId, audio: &[u8]) -> Result<String, ArtifactError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let file_name = artifact_file_name(track_id);
        let path = self.dir.join(&file_name);
        let partial = self.dir.join(format!("{file_name}.partial"));

        // Never expose a half-written file under the final name.
        tokio::fs::write(&partial, audio).await?;
        tokio::fs::rename(&partial, &path).await?;

        tracing::debug!(track_id, path = %path.display(), bytes = audio.len(), "Stored artifact");
        Ok(self.url_for(&file_name))
    }
}

#[cfg(test)]
mod tests {
    use station_core::eligibility::is_playable;

    use super::*;

    #[tokio::test]
    async fn stores_file_named_after_track() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path().join("audio"), "http://cdn.test/audio/");

        let url = store.store(42, b"ID3fake").await.unwrap();

        assert_eq!(url, "http://cdn.test/audio/42.mp3");
        assert!(is_playable(42, Some(&url)));
        let written = tokio::fs::read(dir.path().join("audio/42.mp3")).await.unwrap();
        assert_eq!(written, b"ID3fake");
        assert!(!dir.path().join("audio/42.mp3.partial").exists());
    }
}
