//! Controller for handling webhooks from Nylas.
//!
//! Nylas pushes notetaker state changes and media availability here. The
//! endpoint has no session; it is authenticated by a shared secret header.

use crate::{AppState, Error};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use domain::webhook as WebhookApi;
use log::*;
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

/// Response for webhook acknowledgment
#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookResponse {
    pub status: String,
}

/// POST /api/webhook
///
/// Always acknowledges an authenticated delivery, whether or not the event was recognized.
#[utoipa::path(
    post,
    path = "/api/webhook",
    request_body(content = String, description = "Nylas webhook notification", content_type = "application/json"),
    responses(
        (status = 200, description = "Delivery accepted", body = WebhookResponse),
        (status = 401, description = "Missing or mismatched x-webhook-secret"),
        (status = 500, description = "Webhook secret is not configured"),
    )
)]
pub async fn nylas_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, Error> {
    let headers: HashMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    if WebhookApi::handle(&app_state.config, &app_state.registry, &headers, &body)?.is_none() {
        trace!("Webhook acknowledged without a registry change");
    }

    Ok(Json(WebhookResponse {
        status: "success".to_string(),
    }))
}
