use chrono::{DateTime, Utc};
use domain::job::RetrievalJob;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Either `notetakerId` (start a retrieval) or `jobId` (poll one).
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LinkParams {
    pub(crate) notetaker_id: Option<String>,
    pub(crate) job_id: Option<String>,
    pub(crate) grant_id: Option<String>,
}

/// Named budgets for the server-side wait.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub(crate) enum WaitPolicyName {
    #[default]
    Share,
    Download,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WaitParams {
    pub(crate) job_id: Option<String>,
    #[serde(default)]
    #[param(value_type = Option<String>)]
    pub(crate) policy: WaitPolicyName,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StreamParams {
    pub(crate) notetaker_id: Option<String>,
    pub(crate) grant_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DownloadTokenParams {
    pub(crate) notetaker_id: Option<String>,
    pub(crate) grant_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct DownloadParams {
    pub(crate) token: Option<String>,
}

/// Snapshot of a retrieval job.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobResponse {
    pub(crate) job_id: String,
    /// One of processing, completed, error, timed_out
    pub(crate) status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
}

impl From<RetrievalJob> for JobResponse {
    fn from(job: RetrievalJob) -> Self {
        Self {
            job_id: job.id.to_string(),
            status: job.status.as_str().to_string(),
            url: job.status.url().map(str::to_string),
            error: job.status.error().map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DownloadTokenResponse {
    pub(crate) token: String,
    pub(crate) expires_at: DateTime<Utc>,
    /// Relative URL that streams the recording for this token
    pub(crate) download_url: String,
}
