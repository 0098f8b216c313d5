//! Station playback scheduler.
//!
//! - [`StationScheduler::advance`] decides what plays next and moves the
//!   station along. Safe to call from any number of triggers at once.
//! - [`GenerationClaim`] hands each `PAID` track to exactly one worker.
//! - [`TrackStore`] is the storage boundary; [`PgTrackStore`] is the
//!   production implementation.
//! - [`Notifier`] receives station changes on a best-effort basis.
//!
//! All cross-process coordination goes through the store's atomic writes.
//! Nothing here holds an in-memory lock across calls.

pub mod advance;
pub mod error;
pub mod generation;
pub mod notifier;
pub mod store;

pub use advance::{AdvanceOutcome, StationScheduler};
pub use error::{NotifyError, SchedulerError, StoreError};
pub use generation::GenerationClaim;
pub use notifier::{EventBusNotifier, Notifier, StationUpdate, TrackAdvance, TracingNotifier};
pub use store::memory::InMemoryTrackStore;
pub use store::postgres::PgTrackStore;
pub use store::TrackStore;
