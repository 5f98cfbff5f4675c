//! Shared-secret header validation.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::WebhookValidator;
use crate::error::{webhook_error, Error, WebhookErrorKind};

type HmacSha256 = Hmac<Sha256>;

/// Default header carrying the shared webhook secret.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Validates webhooks that echo a pre-shared secret in a header.
///
/// Comparison digests both values with HMAC-SHA256 and uses `verify_slice`,
/// so it runs in constant time regardless of where the values differ.
pub struct SharedSecretValidator {
    provider_id: String,
    secret: String,
    header: String,
}

impl SharedSecretValidator {
    pub fn new(provider_id: String, secret: String) -> Self {
        Self {
            provider_id,
            secret,
            header: WEBHOOK_SECRET_HEADER.to_string(),
        }
    }

    pub fn with_header(mut self, header: &str) -> Self {
        self.header = header.to_ascii_lowercase();
        self
    }

    fn digest(value: &str) -> Result<HmacSha256, Error> {
        let mut mac = HmacSha256::new_from_slice(b"webhook-secret-comparison")
            .map_err(|_| webhook_error(WebhookErrorKind::InvalidSecret, "Invalid HMAC key"))?;
        mac.update(value.as_bytes());
        Ok(mac)
    }
}

impl WebhookValidator for SharedSecretValidator {
    fn validate(&self, headers: &HashMap<String, String>, _body: &[u8]) -> Result<bool, Error> {
        let provided = headers.get(&self.header).ok_or_else(|| {
            webhook_error(
                WebhookErrorKind::MissingSecret,
                &format!("Missing webhook secret header: {}", self.header),
            )
        })?;

        let expected = Self::digest(&self.secret)?.finalize().into_bytes();
        Ok(Self::digest(provided)?.verify_slice(&expected).is_ok())
    }

    fn provider_id(&self) -> &str {
        &self.provider_id
    }
}
