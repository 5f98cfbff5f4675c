//! Error types for the `domain` layer.
use meeting_ai::Error as ProviderError;
use meeting_auth::error::{
    CapabilityErrorKind, Error as MeetingAuthError, ErrorKind as MeetingAuthErrorKind,
    OAuthErrorKind,
};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field is used to hold the original error that caused
/// the domain error. The intent is to translate errors between layers while maintaining
/// layer boundaries. Ex. `domain` is dependent on `meeting-ai`, and `web` is dependent on `domain`,
/// but `web` should not be dependent, directly, on `meeting-ai`. Each layer is free to define its own
/// error kinds to whatever richness needed at that layer. Ultimately the various `error_kind`s are used
/// by `web` to return appropriate HTTP status codes and messages to the client.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Request(RequestErrorKind),
    Config,
    Other(String),
}

/// Problems with what the caller asked for, detected before or instead of an upstream call.
#[derive(Debug, PartialEq)]
pub enum RequestErrorKind {
    Invalid(String),
    NotFound(String),
    NoConferencingUrl,
    Unauthenticated,
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    /// Upstream answered 502/503/504.
    Unavailable { status: u16, body: String },
    /// A notetaker is already in, or joining, the meeting.
    AlreadyExists { notetaker_id: Option<String> },
    NotFound(String),
    /// Any other non-2xx upstream answer, forwarded as-is.
    Upstream { status: u16, body: String },
    MalformedResponse(String),
    /// The authorization code could not be traded for a grant.
    ExchangeFailed { status: Option<u16>, body: String },
    TimedOut,
    Other(String),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::request(RequestErrorKind::Invalid(message.into()))
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::request(RequestErrorKind::NotFound(message.into()))
    }

    pub(crate) fn unauthenticated(message: &str) -> Self {
        Error {
            source: Some(message.to_string().into()),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Request(
                RequestErrorKind::Unauthenticated,
            )),
        }
    }

    pub(crate) fn config(message: &str) -> Self {
        Error {
            source: Some(message.to_string().into()),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    }

    fn request(kind: RequestErrorKind) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Request(kind)),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the provider layer (`meeting-ai`) to the `domain` layer.
impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        let error_kind = match &err {
            ProviderError::Network(_) => DomainErrorKind::External(ExternalErrorKind::Network),
            ProviderError::Configuration(_) => DomainErrorKind::Internal(InternalErrorKind::Config),
            ProviderError::Authentication(body) => {
                DomainErrorKind::External(ExternalErrorKind::Upstream {
                    status: 401,
                    body: body.clone(),
                })
            }
            ProviderError::NotFound(message) => {
                DomainErrorKind::External(ExternalErrorKind::NotFound(message.clone()))
            }
            ProviderError::AlreadyExists { notetaker_id, .. } => {
                DomainErrorKind::External(ExternalErrorKind::AlreadyExists {
                    notetaker_id: notetaker_id.clone(),
                })
            }
            ProviderError::Unavailable { status, body } => {
                DomainErrorKind::External(ExternalErrorKind::Unavailable {
                    status: *status,
                    body: body.clone(),
                })
            }
            ProviderError::Upstream { status, body } => {
                DomainErrorKind::External(ExternalErrorKind::Upstream {
                    status: *status,
                    body: body.clone(),
                })
            }
            ProviderError::MalformedResponse(message) => {
                DomainErrorKind::External(ExternalErrorKind::MalformedResponse(message.clone()))
            }
            ProviderError::Other(_) => {
                DomainErrorKind::Internal(InternalErrorKind::Other(err.to_string()))
            }
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Errors that result from issues building the reqwest::Client instance. This
        // type of error will occur prior to any network calls being made.
        if err.is_builder() {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                    "Failed to build reqwest client".to_string(),
                )),
            }
        // Errors that result from issues with the network call itself.
        } else {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            }
        }
    }
}

impl From<MeetingAuthError> for Error {
    fn from(err: MeetingAuthError) -> Self {
        let error_kind = match &err.error_kind {
            MeetingAuthErrorKind::Http(_) => DomainErrorKind::External(ExternalErrorKind::Network),
            MeetingAuthErrorKind::OAuth(OAuthErrorKind::InvalidState) => DomainErrorKind::Internal(
                InternalErrorKind::Request(RequestErrorKind::Invalid(
                    "Invalid or expired state".to_string(),
                )),
            ),
            MeetingAuthErrorKind::OAuth(OAuthErrorKind::InvalidAuthorizationUrl)
            | MeetingAuthErrorKind::ApiKey(_)
            | MeetingAuthErrorKind::Capability(CapabilityErrorKind::InvalidKey) => {
                DomainErrorKind::Internal(InternalErrorKind::Config)
            }
            MeetingAuthErrorKind::Webhook(_) | MeetingAuthErrorKind::Capability(_) => {
                DomainErrorKind::Internal(InternalErrorKind::Request(
                    RequestErrorKind::Unauthenticated,
                ))
            }
        };
        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}
