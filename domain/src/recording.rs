//! Locating and relaying finished recordings.

use crate::download_token::{DownloadTokens, IssuedToken};
use crate::error::{DomainErrorKind, Error, ExternalErrorKind};
use crate::gateway::media::MediaClient;
use crate::grant::Grant;
use log::*;
use meeting_ai::traits::notetaker;

pub const DEFAULT_CONTENT_TYPE: &str = "video/webm";
pub const NOT_AVAILABLE: &str = "Recording not available";
pub const NO_RECORDING_URL: &str = "No recording URL found";

/// An open upstream media response whose body has not been read yet.
pub struct MediaStream {
    pub content_type: String,
    pub content_length: Option<u64>,
    pub filename: String,
    response: reqwest::Response,
}

impl MediaStream {
    /// The upstream response, for relaying its body chunk by chunk.
    pub fn into_upstream(self) -> reqwest::Response {
        self.response
    }
}

/// Open the recording of `notetaker_id` for streaming to the caller.
pub async fn open_stream(
    provider: &dyn notetaker::Provider,
    media: &MediaClient,
    grant: &Grant,
    notetaker_id: Option<&str>,
) -> Result<MediaStream, Error> {
    let notetaker_id = required(notetaker_id)?;
    let url = locate(provider, grant, notetaker_id).await?.ok_or_else(|| {
        warn!("Media for notetaker {notetaker_id} has no recording URL");
        not_found(NO_RECORDING_URL)
    })?;

    let response = media.open(&url).await?;
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();
    let content_length = response.content_length();
    debug!(
        "Relaying recording for notetaker {notetaker_id} ({content_type}, {:?} bytes)",
        content_length
    );

    Ok(MediaStream {
        content_type,
        content_length,
        filename: recording_filename(notetaker_id),
        response,
    })
}

/// Issue a download token once the recording is known to exist.
pub async fn issue_download_token(
    provider: &dyn notetaker::Provider,
    tokens: &DownloadTokens,
    grant: &Grant,
    notetaker_id: Option<&str>,
) -> Result<IssuedToken, Error> {
    let notetaker_id = required(notetaker_id)?;
    locate(provider, grant, notetaker_id).await?;
    tokens.issue(grant, notetaker_id)
}

/// Stream the recording a download token was issued for.
pub async fn open_download(
    provider: &dyn notetaker::Provider,
    media: &MediaClient,
    tokens: &DownloadTokens,
    token: Option<&str>,
) -> Result<MediaStream, Error> {
    let (grant, notetaker_id) = tokens.redeem(token)?;
    open_stream(provider, media, &grant, Some(&notetaker_id)).await
}

async fn locate(
    provider: &dyn notetaker::Provider,
    grant: &Grant,
    notetaker_id: &str,
) -> Result<Option<String>, Error> {
    match provider.media(grant.expose(), notetaker_id).await {
        Ok(media) => Ok(media.recording_url.filter(|url| !url.trim().is_empty())),
        Err(meeting_ai::Error::NotFound(_)) => {
            info!("No recording yet for notetaker {notetaker_id}");
            Err(not_found(NOT_AVAILABLE))
        }
        Err(e) => Err(e.into()),
    }
}

/// Attachment name for a recording. The id is caller-supplied, so anything
/// outside `[A-Za-z0-9_-]` becomes `_` before it lands in a header.
fn recording_filename(notetaker_id: &str) -> String {
    let safe: String = notetaker_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("recording_{safe}.webm")
}

fn required(notetaker_id: Option<&str>) -> Result<&str, Error> {
    notetaker_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::invalid("Missing notetakerId"))
}

fn not_found(message: &str) -> Error {
    Error {
        source: None,
        error_kind: DomainErrorKind::External(ExternalErrorKind::NotFound(message.to_string())),
    }
}
