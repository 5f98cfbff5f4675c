//! Webhook request validation.

mod shared_secret;

pub use shared_secret::{SharedSecretValidator, WEBHOOK_SECRET_HEADER};

use std::collections::HashMap;

use crate::error::Error;

/// Trait for validating incoming webhook requests.
pub trait WebhookValidator: Send + Sync {
    /// Validate a webhook request.
    ///
    /// # Arguments
    ///
    /// * `headers` - HTTP headers from the webhook request, names lowercased
    /// * `body` - Raw request body bytes
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the request is authentic, `Ok(false)` if the credential does not match.
    fn validate(&self, headers: &HashMap<String, String>, body: &[u8]) -> Result<bool, Error>;

    /// Get the provider identifier for this validator.
    fn provider_id(&self) -> &str;
}
