//! Track lifecycle status, track source, and the status state machine.
//!
//! Discriminants match the seed order (1-based) of the `track_statuses` and
//! `track_sources` lookup tables. The database crate binds these ids directly.

use serde::{Deserialize, Serialize};

use crate::types::StatusId;

// ---------------------------------------------------------------------------
// TrackStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a track.
///
/// ```text
/// PENDING_PAYMENT -> PAID -> GENERATING -> READY -> PLAYING -> DONE -> ARCHIVED
///                                     \-> FAILED
/// ```
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackStatus {
    PendingPayment = 1,
    Paid = 2,
    Generating = 3,
    Ready = 4,
    Playing = 5,
    Done = 6,
    Archived = 7,
    Failed = 8,
}

impl TrackStatus {
    pub const ALL: [TrackStatus; 8] = [
        TrackStatus::PendingPayment,
        TrackStatus::Paid,
        TrackStatus::Generating,
        TrackStatus::Ready,
        TrackStatus::Playing,
        TrackStatus::Done,
        TrackStatus::Archived,
        TrackStatus::Failed,
    ];

    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Resolve a database status ID. Unknown ids yield `None`.
    pub fn from_id(id: StatusId) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// Upper-case name as stored in `track_statuses.name`.
    pub fn name(self) -> &'static str {
        match self {
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::Paid => "PAID",
            Self::Generating => "GENERATING",
            Self::Ready => "READY",
            Self::Playing => "PLAYING",
            Self::Done => "DONE",
            Self::Archived => "ARCHIVED",
            Self::Failed => "FAILED",
        }
    }
}

impl From<TrackStatus> for StatusId {
    fn from(value: TrackStatus) -> Self {
        value as StatusId
    }
}

impl std::fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// TrackSource
// ---------------------------------------------------------------------------

/// How a track row came to exist.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackSource {
    /// A paid submission that went through generation.
    Generated = 1,
    /// A free queue entry cloned from a previously played track.
    Replay = 2,
}

impl TrackSource {
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            1 => Some(Self::Generated),
            2 => Some(Self::Replay),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

pub mod state_machine {
    use super::TrackStatus;

    /// Statuses reachable from `from` in one step.
    ///
    /// `DONE` only moves on to `ARCHIVED`; replays are new rows, not
    /// re-entries of the played one.
    pub fn valid_transitions(from: TrackStatus) -> &'static [TrackStatus] {
        use TrackStatus::*;
        match from {
            PendingPayment => &[Paid],
            Paid => &[Generating],
            Generating => &[Ready, Failed],
            Ready => &[Playing],
            Playing => &[Done],
            Done => &[Archived],
            Archived | Failed => &[],
        }
    }

    /// Check whether a transition from `from` to `to` is valid.
    pub fn can_transition(from: TrackStatus, to: TrackStatus) -> bool {
        valid_transitions(from).contains(&to)
    }
}
