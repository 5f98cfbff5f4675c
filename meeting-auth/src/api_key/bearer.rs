//! Standard Bearer token authentication.

use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};

use super::{ApiKeyProvider, AuthMethod, ProviderAuth};
use crate::error::{api_key_error, ApiKeyErrorKind, Error};

/// Standard Bearer token authentication.
///
/// Uses the standard `Authorization: Bearer <token>` header pattern.
pub struct BearerTokenAuth {
    provider: ApiKeyProvider,
    token: SecretString,
}

impl BearerTokenAuth {
    /// Create a new Bearer token authenticator.
    pub fn new(provider: ApiKeyProvider, token: SecretString) -> Self {
        Self { provider, token }
    }

    /// Get a reference to the token.
    pub fn token(&self) -> &SecretString {
        &self.token
    }
}

impl ProviderAuth for BearerTokenAuth {
    fn provider(&self) -> ApiKeyProvider {
        self.provider
    }

    fn auth_method(&self) -> AuthMethod {
        AuthMethod::BearerToken
    }

    fn auth_header(&self) -> Result<(HeaderName, HeaderValue), Error> {
        let token = self.token.expose_secret();
        if token.trim().is_empty() {
            return Err(api_key_error(
                ApiKeyErrorKind::NotFound,
                &format!("Empty API key for {}", self.provider.as_str()),
            ));
        }

        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            api_key_error(
                ApiKeyErrorKind::InvalidFormat,
                "API key contains characters not allowed in a header",
            )
        })?;
        value.set_sensitive(true);

        Ok((AUTHORIZATION, value))
    }
}
