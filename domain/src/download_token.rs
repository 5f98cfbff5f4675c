//! Signed, time-boxed download links for finished recordings.

use crate::error::Error;
use crate::grant::Grant;
use chrono::{DateTime, Utc};
use log::*;
use meeting_auth::capability::TokenSigner;
use secrecy::SecretString;
use service::config::Config;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct DownloadTokens {
    signer: TokenSigner,
}

impl DownloadTokens {
    pub fn new(secret: String, ttl: Duration) -> Result<Self, Error> {
        Ok(Self {
            signer: TokenSigner::new(SecretString::new(secret), ttl)?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let secret = config.download_token_secret().ok_or_else(|| {
            error!("DOWNLOAD_TOKEN_SECRET is not configured");
            Error::config("Missing download token secret")
        })?;
        Self::new(secret, config.download_token_ttl())
    }

    pub fn issue(&self, grant: &Grant, notetaker_id: &str) -> Result<IssuedToken, Error> {
        let now = Utc::now();
        let token = self.signer.issue_at(grant.expose(), notetaker_id, now)?;
        Ok(IssuedToken {
            token,
            expires_at: now + self.signer.ttl(),
        })
    }

    /// Check a presented token and return the grant and notetaker it unlocks.
    pub fn redeem(&self, token: Option<&str>) -> Result<(Grant, String), Error> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::unauthenticated("Missing download token"))?;

        let claims = self.signer.verify(token).map_err(|e| {
            info!("Rejected download token: {e}");
            Error::from(e)
        })?;
        Ok((Grant::new(claims.grant_id)?, claims.notetaker_id))
    }
}
