//! Types for calendar event lookups.

use serde::{Deserialize, Serialize};

/// A calendar event as returned by the provider.
///
/// Only the conferencing link is interpreted; everything else is passed
/// through to callers untouched in `raw`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conferencing: Option<Conferencing>,
}

impl Event {
    /// The meeting URL attached to this event, if any.
    pub fn conferencing_url(&self) -> Option<&str> {
        self.conferencing
            .as_ref()
            .and_then(|c| c.details.as_ref())
            .and_then(|d| d.url.as_deref())
            .filter(|url| !url.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conferencing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ConferencingDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConferencingDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Window of time to list events for, as Unix timestamps (seconds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}
