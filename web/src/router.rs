use crate::{params, AppState};
use axum::{
    routing::{get, post},
    Router,
};

use crate::controller::{
    auth_controller, calendar_controller, health_check_controller, notetaker_controller,
    recording_controller, webhook_controller,
};

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI document. To be a part
// of the rendered document, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Notetaker Relay API"
        ),
        paths(
            auth_controller::authorize,
            auth_controller::callback,
            auth_controller::check,
            calendar_controller::index,
            notetaker_controller::create,
            notetaker_controller::read,
            notetaker_controller::leave,
            recording_controller::link,
            recording_controller::wait,
            recording_controller::stream,
            recording_controller::download_token,
            recording_controller::download,
            webhook_controller::nylas_webhook,
        ),
        components(
            schemas(
                params::auth::AuthUrlResponse,
                params::auth::CallbackResponse,
                params::auth::AuthCheckResponse,
                params::calendar::EventsResponse,
                params::notetaker::DispatchParams,
                params::notetaker::LeaveParams,
                params::notetaker::NotetakerResponse,
                params::notetaker::DispatchResponse,
                params::notetaker::SuccessResponse,
                params::recording::WaitPolicyName,
                params::recording::JobResponse,
                params::recording::DownloadTokenResponse,
                webhook_controller::WebhookResponse,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "notetaker_relay", description = "Meeting notetaker dispatch and recording retrieval over Nylas")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines our cookie session based authentication requirement for gaining access to our
// API endpoints for OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "id",
                    "Session id value returned from the auth callback via Set-Cookie header",
                ))),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(auth_routes(app_state.clone()))
        .merge(calendar_routes(app_state.clone()))
        .merge(notetaker_routes(app_state.clone()))
        .merge(recording_routes(app_state.clone()))
        .merge(webhook_routes(app_state.clone()))
        .merge(health_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
}

/// Routes for hosted authentication and the session grant
fn auth_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/auth", post(auth_controller::authorize))
        .route("/api/auth/callback", get(auth_controller::callback))
        .route("/api/auth/check", get(auth_controller::check))
        .with_state(app_state)
}

fn calendar_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/calendar/events", get(calendar_controller::index))
        .with_state(app_state)
}

fn notetaker_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/notetakers", post(notetaker_controller::create))
        // Static segment wins over the {id} capture
        .route("/api/notetakers/leave", post(notetaker_controller::leave))
        .route("/api/notetakers/{id}", get(notetaker_controller::read))
        .with_state(app_state)
}

/// Routes for recording retrieval jobs, streaming and signed downloads
fn recording_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/recordings/link", get(recording_controller::link))
        .route("/api/recordings/link/wait", get(recording_controller::wait))
        .route("/api/recordings/stream", get(recording_controller::stream))
        .route(
            "/api/recordings/download-token",
            post(recording_controller::download_token),
        )
        .route(
            "/api/recordings/download",
            get(recording_controller::download),
        )
        .with_state(app_state)
}

/// Routes for external service webhooks (no session, validated by webhook secret)
fn webhook_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/webhook", post(webhook_controller::nylas_webhook))
        .with_state(app_state)
}

fn health_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check_controller::health_check))
        .with_state(app_state)
}
