use chrono::{DateTime, Utc};
use domain::{Notetaker, Status};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Body for dispatching a notetaker. One of `meetingLink` or `eventId` is required.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DispatchParams {
    pub(crate) meeting_link: Option<String>,
    pub(crate) event_id: Option<String>,
    #[serde(default)]
    pub(crate) notetaker_name: String,
    pub(crate) grant_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LeaveParams {
    pub(crate) notetaker_id: Option<String>,
    pub(crate) grant_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusParams {
    pub(crate) grant_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub(crate) struct LeaveQuery {
    /// Answer immediately and leave in the background (page teardown)
    #[serde(default)]
    pub(crate) beacon: bool,
}

/// A notetaker as reported to clients.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NotetakerResponse {
    pub(crate) notetaker_id: String,
    /// One of requested, joining, active, left, recording_pending, recording_ready, failed
    #[schema(value_type = String)]
    pub(crate) state: Status,
    pub(crate) meeting_link: String,
    pub(crate) notetaker_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) event_id: Option<String>,
    pub(crate) dispatched_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl From<Notetaker> for NotetakerResponse {
    fn from(notetaker: Notetaker) -> Self {
        Self {
            notetaker_id: notetaker.id,
            state: notetaker.state,
            meeting_link: notetaker.meeting_link,
            notetaker_name: notetaker.display_name,
            event_id: notetaker.associated_event_id,
            dispatched_at: notetaker.dispatched_at,
            updated_at: notetaker.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DispatchResponse {
    pub(crate) success: bool,
    pub(crate) notetaker_id: String,
    /// The id was recovered from an unexpected upstream answer rather than a clean success
    pub(crate) recovered: bool,
    pub(crate) notetaker: NotetakerResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct SuccessResponse {
    pub(crate) success: bool,
}
