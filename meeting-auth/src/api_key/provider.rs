//! API key provider trait and types.

use reqwest::header::{HeaderName, HeaderValue};

use crate::error::Error;

/// Known API key providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyProvider {
    Nylas,
}

impl ApiKeyProvider {
    /// Get the provider identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKeyProvider::Nylas => "nylas",
        }
    }
}

/// Authentication method for HTTP requests.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthMethod {
    /// Custom header with optional prefix (e.g., "Authorization: Token xxx")
    ApiKeyHeader {
        header_name: String,
        prefix: Option<String>,
    },
    /// Standard Bearer token
    BearerToken,
}

/// Produces the credential header attached to every request sent to a provider.
///
/// The header is installed once as a default header on the client, marked
/// sensitive so it never shows up in debug output.
pub trait ProviderAuth: Send + Sync {
    /// Get the provider identifier.
    fn provider(&self) -> ApiKeyProvider;

    /// Get the authentication method used by this provider.
    fn auth_method(&self) -> AuthMethod;

    /// Build the header name and value carrying the credential.
    fn auth_header(&self) -> Result<(HeaderName, HeaderValue), Error>;
}
