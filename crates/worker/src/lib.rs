//! Generation worker.
//!
//! Claims `PAID` tracks one at a time, asks the audio provider for the audio,
//! stores it as `<id>.mp3`, records the result and nudges the station so an
//! idle channel picks the new track up straight away.

pub mod artifacts;
pub mod config;
pub mod provider;
pub mod runner;

pub use artifacts::{ArtifactError, ArtifactStore, LocalArtifactStore};
pub use config::WorkerConfig;
pub use provider::{
    AudioProvider, GeneratedAudio, GenerationRequest, HttpAudioProvider, ProviderError,
};
pub use runner::GenerationWorker;
