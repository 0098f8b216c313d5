//! Wall clock seam and playhead arithmetic.
//!
//! The playhead is never stored: it is derived from the persisted
//! `current_started_at` and the current time every time it is needed.

use std::sync::Mutex;

use crate::types::{DbId, Timestamp};

/// Source of "now" for everything that compares against stored timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Production clock backed by [`chrono::Utc::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now()
    }
}

/// Clock that only moves when told to. Used to drive playback in tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, to: Timestamp) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Elapsed whole seconds into the current track.
///
/// Zero when nothing is on air or the start instant is unknown. Clock skew
/// that puts `started_at` in the future also yields zero.
pub fn playhead_seconds(
    current_track_id: Option<DbId>,
    current_started_at: Option<Timestamp>,
    now: Timestamp,
) -> i64 {
    match (current_track_id, current_started_at) {
        (Some(_), Some(started_at)) => (now - started_at).num_seconds().max(0),
        _ => 0,
    }
}

/// Whether the current track has played out.
///
/// `None` means there is no current track, which counts as finished.
pub fn is_finished(current_duration_secs: Option<i32>, playhead: i64) -> bool {
    match current_duration_secs {
        None => true,
        Some(duration) => playhead >= i64::from(duration),
    }
}
