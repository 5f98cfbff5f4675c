//! Signed, time-boxed capability tokens.
//!
//! A token grants the bearer permission to download one notetaker's recording
//! under one grant until it expires. Layout:
//!
//! ```text
//! base64url("<grant_id>:<notetaker_id>:<expires_at_unix>") "." hex(hmac_sha256(payload))
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::error::{capability_error, CapabilityErrorKind, Error};

type HmacSha256 = Hmac<Sha256>;

/// What a verified token authorizes.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityClaims {
    pub grant_id: String,
    pub notetaker_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies capability tokens with a server-side key.
pub struct TokenSigner {
    key: SecretString,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(key: SecretString, ttl: std::time::Duration) -> Result<Self, Error> {
        if key.expose_secret().is_empty() {
            return Err(capability_error(
                CapabilityErrorKind::InvalidKey,
                "Capability signing key must not be empty",
            ));
        }
        let ttl = Duration::from_std(ttl).map_err(|_| {
            capability_error(CapabilityErrorKind::InvalidKey, "Token lifetime out of range")
        })?;
        Ok(Self { key, ttl })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, grant_id: &str, notetaker_id: &str) -> Result<String, Error> {
        self.issue_at(grant_id, notetaker_id, Utc::now())
    }

    pub fn issue_at(
        &self,
        grant_id: &str,
        notetaker_id: &str,
        now: DateTime<Utc>,
    ) -> Result<String, Error> {
        if grant_id.contains(':') || grant_id.is_empty() || notetaker_id.is_empty() {
            return Err(capability_error(
                CapabilityErrorKind::Malformed,
                "Grant and notetaker ids must be non-empty and the grant id must not contain ':'",
            ));
        }

        let expires_at = (now + self.ttl).timestamp();
        let payload = format!("{grant_id}:{notetaker_id}:{expires_at}");
        let signature = hex::encode(self.mac(payload.as_bytes())?.finalize().into_bytes());

        Ok(format!("{}.{}", URL_SAFE_NO_PAD.encode(payload), signature))
    }

    pub fn verify(&self, token: &str) -> Result<CapabilityClaims, Error> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<CapabilityClaims, Error> {
        let malformed = || capability_error(CapabilityErrorKind::Malformed, "Malformed token");

        let (encoded, signature) = token.split_once('.').ok_or_else(malformed)?;
        let payload = URL_SAFE_NO_PAD.decode(encoded).map_err(|_| malformed())?;
        let signature = hex::decode(signature).map_err(|_| malformed())?;

        self.mac(&payload)?.verify_slice(&signature).map_err(|_| {
            capability_error(
                CapabilityErrorKind::InvalidSignature,
                "Token signature does not match",
            )
        })?;

        let payload = String::from_utf8(payload).map_err(|_| malformed())?;
        let (grant_id, rest) = payload.split_once(':').ok_or_else(malformed)?;
        let (notetaker_id, expires_at) = rest.rsplit_once(':').ok_or_else(malformed)?;
        let expires_at = expires_at
            .parse::<i64>()
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .ok_or_else(malformed)?;

        if now >= expires_at {
            return Err(capability_error(
                CapabilityErrorKind::Expired,
                "Token has expired",
            ));
        }

        Ok(CapabilityClaims {
            grant_id: grant_id.to_string(),
            notetaker_id: notetaker_id.to_string(),
            expires_at,
        })
    }

    fn mac(&self, payload: &[u8]) -> Result<HmacSha256, Error> {
        let mut mac = HmacSha256::new_from_slice(self.key.expose_secret().as_bytes())
            .map_err(|_| capability_error(CapabilityErrorKind::InvalidKey, "Invalid HMAC key"))?;
        mac.update(payload);
        Ok(mac)
    }
}
