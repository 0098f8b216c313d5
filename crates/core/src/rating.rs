//! Listener reactions and the rating aggregate they feed.
//!
//! The scheduler never writes `rating_score` itself; it is recomputed from
//! the `track_reactions` rows whenever a reaction changes.

use crate::error::CoreError;

/// Reaction value for a thumbs-up.
pub const LIKE: i16 = 1;

/// Reaction value for a thumbs-down.
pub const DISLIKE: i16 = -1;

/// Lower bound of `rating_score`.
pub const MIN_RATING: f64 = -1.0;

/// Upper bound of `rating_score`.
pub const MAX_RATING: f64 = 1.0;

/// Maximum listener handle length.
pub const MAX_LISTENER_LEN: usize = 64;

/// Only [`LIKE`] and [`DISLIKE`] are accepted.
pub fn validate_reaction(value: i16) -> Result<(), CoreError> {
    if value == LIKE || value == DISLIKE {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Reaction must be {LIKE} or {DISLIKE}, got {value}"
        )))
    }
}

/// Listener handles are opaque but must be present and short.
pub fn validate_listener(listener: &str) -> Result<(), CoreError> {
    let trimmed = listener.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_LISTENER_LEN {
        return Err(CoreError::Validation(format!(
            "Listener must be 1-{MAX_LISTENER_LEN} characters"
        )));
    }
    Ok(())
}

/// Mean of reaction values, clamped into the rating bounds. No reactions
/// means a neutral 0.0.
pub fn aggregate(sum: i64, count: i64) -> f64 {
    if count <= 0 {
        return 0.0;
    }
    (sum as f64 / count as f64).clamp(MIN_RATING, MAX_RATING)
}
