//! Next-track selection and replay scoring.
//!
//! Fresh `READY` submissions always go first, oldest first. Only when none
//! are left does the station fall back to replaying a `DONE` track, ranked by
//!
//! ```text
//! score = rating_score + recency_bonus
//! recency_bonus = 1.0                                  (never played)
//!               = min(hours_since_last_played * 0.1, 2.0)
//! ```
//!
//! Callers are expected to have run the eligibility filter already.

use std::cmp::Ordering;

use crate::eligibility;
use crate::track_status::TrackStatus;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Scoring constants
// ---------------------------------------------------------------------------

/// Head start for a track that has never been played.
pub const NEVER_PLAYED_BONUS: f64 = 1.0;

/// Bonus accrued per hour since the last play.
pub const BONUS_PER_HOUR: f64 = 0.1;

/// Ceiling on the recency bonus (reached after 20 hours).
pub const MAX_RECENCY_BONUS: f64 = 2.0;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// The view of a track the selection engine needs.
///
/// Implemented by the database row type so selection runs on stored tracks
/// without copying them.
pub trait Candidate {
    fn track_id(&self) -> DbId;
    fn status(&self) -> Option<TrackStatus>;
    fn created_at(&self) -> Timestamp;
    fn rating_score(&self) -> f64;
    fn rating_count(&self) -> i32;
    fn last_played_at(&self) -> Option<Timestamp>;
    fn audio_url(&self) -> Option<&str>;

    /// Eligibility filter applied to this candidate.
    fn is_playable(&self) -> bool {
        eligibility::is_playable(self.track_id(), self.audio_url())
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Recency component of the replay score.
pub fn recency_bonus(last_played_at: Option<Timestamp>, now: Timestamp) -> f64 {
    match last_played_at {
        None => NEVER_PLAYED_BONUS,
        Some(played) => {
            let hours = ((now - played).num_milliseconds() as f64 / MILLIS_PER_HOUR).max(0.0);
            (hours * BONUS_PER_HOUR).min(MAX_RECENCY_BONUS)
        }
    }
}

/// Replay score for a `DONE` candidate. A non-finite stored rating counts as 0.
pub fn selection_score<T: Candidate + ?Sized>(track: &T, now: Timestamp) -> f64 {
    let rating = track.rating_score();
    let rating = if rating.is_finite() { rating } else { 0.0 };
    rating + recency_bonus(track.last_played_at(), now)
}

/// Total order over replay candidates: higher score, then more ratings,
/// then the older row, then the lower id.
fn compare_replay<T: Candidate>(a: &T, b: &T, now: Timestamp) -> Ordering {
    selection_score(a, now)
        .total_cmp(&selection_score(b, now))
        .then_with(|| a.rating_count().cmp(&b.rating_count()))
        .then_with(|| b.created_at().cmp(&a.created_at()))
        .then_with(|| b.track_id().cmp(&a.track_id()))
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Earliest-created `READY` candidate. Equal timestamps keep input order.
pub fn next_fresh<T: Candidate>(candidates: &[T]) -> Option<&T> {
    candidates
        .iter()
        .filter(|c| c.status() == Some(TrackStatus::Ready))
        .fold(None, |best: Option<&T>, c| match best {
            Some(b) if b.created_at() <= c.created_at() => Some(b),
            _ => Some(c),
        })
}

/// Highest-scoring `DONE` candidate.
pub fn best_replay<T: Candidate>(candidates: &[T], now: Timestamp) -> Option<&T> {
    candidates
        .iter()
        .filter(|c| c.status() == Some(TrackStatus::Done))
        .max_by(|a, b| compare_replay(*a, *b, now))
}

/// Pick what plays next. Candidates in any other status are ignored.
pub fn select_next<T: Candidate>(candidates: &[T], now: Timestamp) -> Option<&T> {
    next_fresh(candidates).or_else(|| best_replay(candidates, now))
}
