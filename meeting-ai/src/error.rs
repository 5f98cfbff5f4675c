//! Error types for meeting provider operations.

use std::fmt;

/// Universal error type that abstracts provider-specific errors into common variants.
///
/// Provider implementations map their native failures to these variants so the
/// domain layer can decide how each one surfaces to users. Upstream status codes
/// and bodies are preserved wherever the provider returned them.
#[derive(Debug)]
pub enum Error {
    /// The provider rejected our credentials or the grant is no longer valid.
    Authentication(String),

    /// Network connectivity issues, DNS failures, or connection timeouts.
    Network(String),

    /// Missing or invalid local configuration (API key, client id, base URL).
    Configuration(String),

    /// The requested resource (grant, event, notetaker media) does not exist upstream.
    NotFound(String),

    /// A notetaker is already in this meeting, or is still joining it.
    /// The provider sometimes embeds the existing bot's id in the error body.
    AlreadyExists {
        notetaker_id: Option<String>,
        body: String,
    },

    /// The provider is temporarily unavailable (502/503/504). Safe to try again later.
    Unavailable { status: u16, body: String },

    /// Any other non-2xx response, kept verbatim for diagnosis.
    Upstream { status: u16, body: String },

    /// A 2xx response whose body did not have the expected shape.
    MalformedResponse(String),

    /// Catch-all for errors that don't fit other categories.
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Upstream HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Unavailable { status, .. } | Error::Upstream { status, .. } => Some(*status),
            Error::NotFound(_) => Some(404),
            Error::AlreadyExists { .. } => Some(409),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Authentication(msg) => write!(f, "Authentication failed: {}", msg),
            Error::Network(msg) => write!(f, "Network error: {}", msg),
            Error::Configuration(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::AlreadyExists { notetaker_id, .. } => match notetaker_id {
                Some(id) => write!(f, "Notetaker {} already exists for this meeting", id),
                None => write!(f, "Notetaker already exists for this meeting"),
            },
            Error::Unavailable { status, .. } => {
                write!(f, "Provider unavailable ({}), try again later", status)
            }
            Error::Upstream { status, body } => {
                write!(f, "Provider responded with status {}: {}", status, body)
            }
            Error::MalformedResponse(msg) => write!(f, "Malformed provider response: {}", msg),
            Error::Other(err) => write!(f, "Other error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
