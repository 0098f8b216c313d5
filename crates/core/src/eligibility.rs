//! Audio artifact eligibility.
//!
//! A track may only be put on air when its `audio_url` points at the artifact
//! generated for that very track: the final path segment must be
//! `<track-id>.mp3` (case-insensitive). Anything else means generation wrote
//! nothing or the reference was copied from another row.

use crate::types::DbId;

/// File extension every playable artifact carries.
pub const AUDIO_EXTENSION: &str = "mp3";

/// Expected artifact file name for a track.
pub fn artifact_file_name(track_id: DbId) -> String {
    format!("{track_id}.{AUDIO_EXTENSION}")
}

/// Whether `audio_url` is a well-formed artifact reference for `track_id`.
///
/// Query strings and fragments are ignored so signed URLs still match.
pub fn is_playable(track_id: DbId, audio_url: Option<&str>) -> bool {
    let Some(url) = audio_url.map(str::trim).filter(|u| !u.is_empty()) else {
        return false;
    };

    let path = url.split(['?', '#']).next().unwrap_or_default();
    let segment = path.rsplit('/').next().unwrap_or_default();

    segment.eq_ignore_ascii_case(&artifact_file_name(track_id))
}
