//! Types for notetaker bot operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a notetaker dispatched into a meeting.
///
/// ```text
/// Requested → Joining → Active → Left → RecordingPending → RecordingReady
///                                                        ↘ Failed
/// ```
///
/// `Left` is reachable from any pre-`Left` state because the user may send the
/// bot away before it is admitted. `Failed` is reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Requested,
    Joining,
    Active,
    Left,
    RecordingPending,
    RecordingReady,
    Failed,
}

impl Status {
    /// Whether the bot may still be in the call.
    pub fn is_in_meeting(self) -> bool {
        matches!(self, Status::Requested | Status::Joining | Status::Active)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Status::RecordingReady | Status::Failed)
    }

    pub fn has_left(self) -> bool {
        !self.is_in_meeting()
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: Status) -> bool {
        use Status::*;
        match (self, next) {
            (Requested, Joining) | (Joining, Active) | (Requested, Active) => true,
            (Requested | Joining | Active, Left) => true,
            (Left, RecordingPending) => true,
            // A webhook may announce media before anyone asked for it.
            (Left | RecordingPending, RecordingReady) => true,
            // Retrieval may be requested again after a failed attempt.
            (Failed, RecordingPending) => true,
            (current, Failed) => !current.is_terminal(),
            _ => false,
        }
    }
}

/// One dispatched notetaker as tracked locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notetaker {
    pub id: String,
    pub state: Status,
    pub meeting_link: String,
    pub display_name: String,
    pub associated_event_id: Option<String>,
    pub dispatched_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notetaker {
    pub fn new(
        id: String,
        meeting_link: String,
        display_name: String,
        associated_event_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            state: Status::Requested,
            meeting_link,
            display_name,
            associated_event_id,
            dispatched_at: now,
            updated_at: now,
        }
    }

    /// Move to `next` if the lifecycle allows it. Returns whether the state changed.
    pub fn advance(&mut self, next: Status) -> bool {
        if self.state == next || !self.state.can_transition_to(next) {
            return false;
        }
        self.state = next;
        self.updated_at = Utc::now();
        true
    }
}

/// Parameters for dispatching a notetaker into a meeting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub meeting_link: String,
    pub notetaker_name: String,
}

/// Outcome of a dispatch the provider accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct Created {
    pub notetaker_id: String,
    /// The id was read from a body outside the provider's usual success shape.
    pub recovered: bool,
}

impl Created {
    pub fn new(notetaker_id: impl Into<String>) -> Self {
        Self {
            notetaker_id: notetaker_id.into(),
            recovered: false,
        }
    }

    pub fn recovered(notetaker_id: impl Into<String>) -> Self {
        Self {
            notetaker_id: notetaker_id.into(),
            recovered: true,
        }
    }
}

/// Where a finished recording can be fetched from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    /// Pre-signed locator, absent when the provider has no recording yet.
    pub recording_url: Option<String>,
}
