//! Hosted authorization URL construction.

use url::Url;

use super::{PkceVerifier, StateManager};
use crate::error::{oauth_error, Error, OAuthErrorKind};

/// A prepared redirect to the provider's hosted consent screen.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// Authorization URL to redirect the user to.
    pub url: String,
    /// CSRF state parameter, already registered with the `StateManager`.
    pub state: String,
}

impl AuthorizationRequest {
    /// Build `{auth_endpoint}?client_id&redirect_uri&response_type=code&state&code_challenge...`.
    ///
    /// A fresh PKCE verifier is generated and stored against the new state so the
    /// callback can recover it.
    pub fn build(
        auth_endpoint: &str,
        client_id: &str,
        redirect_uri: &str,
        states: &StateManager,
    ) -> Result<Self, Error> {
        let mut url = Url::parse(auth_endpoint).map_err(|e| {
            oauth_error(
                OAuthErrorKind::InvalidAuthorizationUrl,
                &format!("Invalid authorization endpoint {auth_endpoint}: {e}"),
            )
        })?;

        let verifier = PkceVerifier::generate();
        let challenge = verifier.challenge();
        let state = states.generate(Some(verifier.into_string()));

        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("state", &state)
            .append_pair("code_challenge", challenge.as_str())
            .append_pair("code_challenge_method", challenge.method());

        Ok(Self {
            url: url.to_string(),
            state,
        })
    }
}
