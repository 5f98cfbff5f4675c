//! Inbound notetaker webhooks.
//!
//! Nylas pushes bot state changes and media availability. Recognized events
//! advance the notetaker registry; anything else is acknowledged and ignored.

use crate::error::Error;
use crate::notetaker::NotetakerRegistry;
use log::*;
use meeting_ai::Status;
use meeting_auth::webhook::{SharedSecretValidator, WebhookValidator};
use serde::Deserialize;
use service::config::Config;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct Notification {
    #[serde(rename = "type")]
    kind: String,
    data: NotificationData,
}

#[derive(Debug, Deserialize)]
struct NotificationData {
    object: NotetakerObject,
}

#[derive(Debug, Deserialize)]
struct NotetakerObject {
    id: String,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    meeting_state: Option<String>,
}

/// A registry change a webhook asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub notetaker_id: String,
    pub status: Status,
    /// Whether the registry knew the bot and accepted the transition.
    pub accepted: bool,
}

/// Authenticate a webhook delivery and apply it.
///
/// Header names must be lowercase.
pub fn handle(
    config: &Config,
    registry: &NotetakerRegistry,
    headers: &HashMap<String, String>,
    body: &[u8],
) -> Result<Option<Applied>, Error> {
    let secret = config.webhook_secret().ok_or_else(|| {
        error!("WEBHOOK_SECRET is not configured");
        Error::config("Missing webhook secret")
    })?;

    let validator = SharedSecretValidator::new("nylas".to_string(), secret);
    if !validator.validate(headers, body)? {
        warn!("Rejected webhook with mismatched secret");
        return Err(Error::unauthenticated("Unauthorized"));
    }

    debug!("Webhook received: {}", String::from_utf8_lossy(body));
    Ok(apply(registry, body))
}

fn apply(registry: &NotetakerRegistry, body: &[u8]) -> Option<Applied> {
    let notification: Notification = match serde_json::from_slice(body) {
        Ok(notification) => notification,
        Err(e) => {
            debug!("Ignoring webhook body that is not a notetaker event: {e}");
            return None;
        }
    };

    let object = notification.data.object;
    let status = match notification.kind.as_str() {
        "notetaker.media" => match object.state.as_deref() {
            Some("available") => Status::RecordingReady,
            _ => return None,
        },
        "notetaker.meeting_state" => {
            match object.meeting_state.as_deref().or(object.state.as_deref()) {
                Some("attending") => Status::Active,
                Some("left_meeting") => Status::Left,
                Some("failed_entry") => Status::Failed,
                _ => return None,
            }
        }
        other => {
            debug!("Ignoring webhook of type {other}");
            return None;
        }
    };

    let accepted = registry.advance(&object.id, status).unwrap_or(false);
    info!(
        "Webhook {} for notetaker {} -> {:?} (accepted: {accepted})",
        notification.kind, object.id, status
    );
    Some(Applied {
        notetaker_id: object.id,
        status,
        accepted,
    })
}
