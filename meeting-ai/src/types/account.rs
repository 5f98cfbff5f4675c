//! Types for the hosted authentication flow.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameters for exchanging an authorization code for a grant.
#[derive(Clone, Serialize)]
pub struct CodeExchange {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub code: String,
    pub code_verifier: String,
    pub grant_type: String,
}

impl CodeExchange {
    pub fn new(
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        code: &str,
        code_verifier: &str,
    ) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            code: code.to_string(),
            code_verifier: code_verifier.to_string(),
            grant_type: "authorization_code".to_string(),
        }
    }
}

impl fmt::Debug for CodeExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeExchange")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("code", &"[REDACTED]")
            .field("grant_type", &self.grant_type)
            .finish()
    }
}

/// Successful token exchange. Only the grant id is kept; access tokens are
/// never needed because every call goes through the application API key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GrantInfo {
    pub grant_id: String,
    #[serde(default)]
    pub email: Option<String>,
}
