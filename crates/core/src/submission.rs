//! Validation for new track submissions.

use crate::error::CoreError;

/// Track lengths the generation provider is asked for, in seconds.
pub const ALLOWED_DURATIONS_SECS: [i32; 4] = [30, 60, 120, 180];

/// Maximum prompt length in characters.
pub const MAX_PROMPT_CHARS: usize = 500;

/// Reject blank or oversized prompts.
pub fn validate_prompt(prompt: &str) -> Result<(), CoreError> {
    if prompt.trim().is_empty() {
        return Err(CoreError::Validation("Prompt must not be empty".into()));
    }
    let chars = prompt.chars().count();
    if chars > MAX_PROMPT_CHARS {
        return Err(CoreError::Validation(format!(
            "Prompt is {chars} characters, maximum is {MAX_PROMPT_CHARS}"
        )));
    }
    Ok(())
}

/// Reject durations outside [`ALLOWED_DURATIONS_SECS`].
pub fn validate_duration(duration_secs: i32) -> Result<(), CoreError> {
    if ALLOWED_DURATIONS_SECS.contains(&duration_secs) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Duration must be one of {ALLOWED_DURATIONS_SECS:?} seconds, got {duration_secs}"
        )))
    }
}

/// Reject negative prices. Replays are the only zero-price rows the
/// scheduler creates; submissions may be free too.
pub fn validate_price(price_cents: i64) -> Result<(), CoreError> {
    if price_cents < 0 {
        return Err(CoreError::Validation("Price must not be negative".into()));
    }
    Ok(())
}
