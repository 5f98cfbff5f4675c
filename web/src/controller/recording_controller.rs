//! Recording retrieval: asynchronous link jobs, streaming relay, and signed downloads.

use crate::extractors::session_grant::SessionGrant;
use crate::params::recording::{
    DownloadParams, DownloadTokenParams, DownloadTokenResponse, JobResponse, LinkParams,
    StreamParams, WaitParams, WaitPolicyName,
};
use crate::{AppState, Error};
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use domain::download_token::DownloadTokens;
use domain::job::JobStatus;
use domain::recording::{self as RecordingApi, MediaStream};
use log::*;

/// GET start retrieving a recording link (`notetakerId`) or poll a retrieval (`jobId`)
#[utoipa::path(
    get,
    path = "/api/recordings/link",
    params(LinkParams),
    responses(
        (status = 200, description = "Job snapshot", body = JobResponse),
        (status = 202, description = "Retrieval started or already running", body = JobResponse),
        (status = 400, description = "Missing notetakerId"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Job not found"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn link(
    State(app_state): State<AppState>,
    session_grant: SessionGrant,
    Query(params): Query<LinkParams>,
) -> Result<impl IntoResponse, Error> {
    if let Some(job_id) = params.job_id.as_deref() {
        trace!("GET poll job {job_id}");
        let job = app_state.jobs.snapshot(job_id)?;
        return Ok((StatusCode::OK, Json(JobResponse::from(job))));
    }

    let grant = session_grant.or_explicit(params.grant_id.as_deref())?;
    let job = app_state
        .jobs
        .request_link(&grant, params.notetaker_id.as_deref())?;
    debug!("Retrieval job {} is {}", job.id, job.status.as_str());

    Ok((StatusCode::ACCEPTED, Json(JobResponse::from(job))))
}

/// GET wait on the server for a retrieval job to finish
#[utoipa::path(
    get,
    path = "/api/recordings/link/wait",
    params(WaitParams),
    responses(
        (status = 200, description = "Job finished", body = JobResponse),
        (status = 400, description = "Missing jobId"),
        (status = 404, description = "Job not found"),
        (status = 408, description = "Job still processing when the wait budget ran out", body = JobResponse),
    )
)]
pub async fn wait(
    State(app_state): State<AppState>,
    Query(params): Query<WaitParams>,
) -> Result<impl IntoResponse, Error> {
    let job_id = params
        .job_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| Error::bad_request("Missing jobId"))?;

    let policy = match params.policy {
        WaitPolicyName::Share => app_state.wait_policies.share,
        WaitPolicyName::Download => app_state.wait_policies.download,
    };
    let job = app_state.jobs.wait(job_id, policy).await?;

    let status = if job.status == JobStatus::TimedOut {
        info!("Wait on job {job_id} timed out");
        StatusCode::REQUEST_TIMEOUT
    } else {
        StatusCode::OK
    };
    Ok((status, Json(JobResponse::from(job))))
}

/// GET stream a finished recording through this server
#[utoipa::path(
    get,
    path = "/api/recordings/stream",
    params(StreamParams),
    responses(
        (status = 200, description = "Recording bytes", content_type = "video/webm"),
        (status = 400, description = "Missing notetakerId"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Recording not available, or no recording URL"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn stream(
    State(app_state): State<AppState>,
    session_grant: SessionGrant,
    Query(params): Query<StreamParams>,
) -> Result<Response, Error> {
    let grant = session_grant.or_explicit(params.grant_id.as_deref())?;

    let media = RecordingApi::open_stream(
        app_state.notetakers.as_ref(),
        &app_state.media,
        &grant,
        params.notetaker_id.as_deref(),
    )
    .await?;

    relay(media)
}

/// POST issue a short-lived token that downloads a recording without a session
#[utoipa::path(
    post,
    path = "/api/recordings/download-token",
    request_body = DownloadTokenParams,
    responses(
        (status = 200, description = "Signed download token", body = DownloadTokenResponse),
        (status = 400, description = "Missing notetakerId"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Recording not available"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn download_token(
    State(app_state): State<AppState>,
    session_grant: SessionGrant,
    Json(params): Json<DownloadTokenParams>,
) -> Result<impl IntoResponse, Error> {
    let grant = session_grant.or_explicit(params.grant_id.as_deref())?;
    let tokens = DownloadTokens::from_config(&app_state.config)?;

    let issued = RecordingApi::issue_download_token(
        app_state.notetakers.as_ref(),
        &tokens,
        &grant,
        params.notetaker_id.as_deref(),
    )
    .await?;

    Ok(Json(DownloadTokenResponse {
        download_url: format!("/api/recordings/download?token={}", issued.token),
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}

/// GET stream the recording a download token was issued for
#[utoipa::path(
    get,
    path = "/api/recordings/download",
    params(DownloadParams),
    responses(
        (status = 200, description = "Recording bytes", content_type = "video/webm"),
        (status = 401, description = "Missing, invalid or expired token"),
        (status = 404, description = "Recording not available"),
    )
)]
pub async fn download(
    State(app_state): State<AppState>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, Error> {
    let tokens = DownloadTokens::from_config(&app_state.config)?;

    let media = RecordingApi::open_download(
        app_state.notetakers.as_ref(),
        &app_state.media,
        &tokens,
        params.token.as_deref(),
    )
    .await?;

    relay(media)
}

/// Pass the upstream body through chunk by chunk.
fn relay(media: MediaStream) -> Result<Response, Error> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, media.content_type.as_str())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", media.filename),
        );
    if let Some(length) = media.content_length {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }

    let body = Body::from_stream(media.into_upstream().bytes_stream());
    builder
        .body(body)
        .map_err(|e| Error::internal(e, "Failed to build recording response"))
}
