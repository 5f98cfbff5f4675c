use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use domain::error::{
    DomainErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind, RequestErrorKind,
};

use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

/// Body of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl Error {
    pub(crate) fn bad_request(message: &str) -> Self {
        Self(DomainError {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Request(
                RequestErrorKind::Invalid(message.to_string()),
            )),
        })
    }

    /// A failure inside this server that the caller cannot fix.
    pub(crate) fn internal<E>(err: E, message: &str) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(DomainError {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(message.to_string())),
        })
    }

    /// Status code, summary and diagnostic detail for this error.
    fn parts(&self) -> (StatusCode, String, Option<String>) {
        let cause = self.0.source.as_ref().map(|source| source.to_string());

        match &self.0.error_kind {
            DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
                InternalErrorKind::Request(request_error_kind) => match request_error_kind {
                    RequestErrorKind::Invalid(message) => {
                        (StatusCode::BAD_REQUEST, message.clone(), None)
                    }
                    RequestErrorKind::NoConferencingUrl => (
                        StatusCode::BAD_REQUEST,
                        "No conferencing URL found for this event".to_string(),
                        None,
                    ),
                    RequestErrorKind::NotFound(message) => {
                        (StatusCode::NOT_FOUND, message.clone(), None)
                    }
                    RequestErrorKind::Unauthenticated => (
                        StatusCode::UNAUTHORIZED,
                        cause.unwrap_or_else(|| "Unauthorized".to_string()),
                        None,
                    ),
                },
                InternalErrorKind::Config => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server configuration error".to_string(),
                    cause,
                ),
                InternalErrorKind::Other(message) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Some(message.clone()),
                ),
            },
            DomainErrorKind::External(external_error_kind) => match external_error_kind {
                ExternalErrorKind::Network => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to connect to Nylas".to_string(),
                    cause,
                ),
                ExternalErrorKind::Unavailable { status, body } => (
                    StatusCode::BAD_GATEWAY,
                    "Nylas API is currently unavailable. Please try again later.".to_string(),
                    Some(format!("{status}: {body}")),
                ),
                ExternalErrorKind::AlreadyExists { notetaker_id } => (
                    StatusCode::CONFLICT,
                    "Notetaker already exists for this meeting".to_string(),
                    notetaker_id
                        .as_ref()
                        .map(|id| format!("Existing notetaker: {id}")),
                ),
                ExternalErrorKind::NotFound(message) => {
                    (StatusCode::NOT_FOUND, message.clone(), None)
                }
                ExternalErrorKind::Upstream { status, body } => (
                    StatusCode::from_u16(*status)
                        .ok()
                        .filter(|status| !status.is_success())
                        .unwrap_or(StatusCode::BAD_GATEWAY),
                    "Nylas API request failed".to_string(),
                    Some(body.clone()),
                ),
                ExternalErrorKind::MalformedResponse(message) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Unexpected response from Nylas".to_string(),
                    Some(message.clone()),
                ),
                ExternalErrorKind::ExchangeFailed { status, body } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to exchange authorization code".to_string(),
                    Some(match status {
                        Some(status) => format!("{status}: {body}"),
                        None => body.clone(),
                    }),
                ),
                ExternalErrorKind::TimedOut => {
                    (StatusCode::REQUEST_TIMEOUT, "Timed out".to_string(), None)
                }
                ExternalErrorKind::Other(message) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Some(message.clone()),
                ),
            },
        }
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error, details) = self.parts();
        if status.is_server_error() {
            error!("{status}: {error} ({:?})", self.0);
        } else {
            debug!("{status}: {error}");
        }
        (status, Json(ErrorBody { error, details })).into_response()
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
