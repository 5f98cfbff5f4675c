//! HTTP surface of the notetaker relay.

use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use domain::gateway::media::MediaClient;
use domain::gateway::nylas::NylasClient;
use domain::job::{JobStore, RecordingJobs, TaskRegistry};
use domain::notetaker::NotetakerRegistry;
use domain::polling::PollPolicy;
use domain::providers::{account, calendar, notetaker};
use log::*;
use meeting_auth::oauth::StateManager;
use service::config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_sessions::{cookie::SameSite, MemoryStore, SessionManagerLayer};

mod controller;
mod error;
mod extractors;
mod params;
mod router;

pub use self::error::{Error, Result};

/// How long the server-side wait endpoint keeps polling, per named policy.
#[derive(Clone, Copy, Debug)]
pub struct WaitPolicies {
    pub share: PollPolicy,
    pub download: PollPolicy,
}

impl Default for WaitPolicies {
    fn default() -> Self {
        Self {
            share: PollPolicy::share_link(),
            download: PollPolicy::download(),
        }
    }
}

// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub accounts: Arc<dyn account::Provider>,
    pub calendar: Arc<dyn calendar::Provider>,
    pub notetakers: Arc<dyn notetaker::Provider>,
    pub registry: Arc<NotetakerRegistry>,
    pub jobs: RecordingJobs,
    pub tasks: TaskRegistry,
    pub media: Arc<MediaClient>,
    pub oauth_states: Arc<StateManager>,
    pub wait_policies: WaitPolicies,
}

impl AppState {
    /// Wire every component against the Nylas API named in `config`.
    pub fn new(
        config: Config,
        tasks: TaskRegistry,
        store: Arc<dyn JobStore>,
    ) -> core::result::Result<Self, domain::error::Error> {
        let nylas = Arc::new(NylasClient::new(&config)?);
        let media = Arc::new(MediaClient::new(config.upstream_timeout())?);
        let registry = Arc::new(NotetakerRegistry::new());
        let jobs = RecordingJobs::new(
            store,
            tasks.clone(),
            registry.clone(),
            nylas.clone(),
            PollPolicy::media_retry(config.media_not_found_retries),
        );

        Ok(Self {
            config,
            accounts: nylas.clone(),
            calendar: nylas.clone(),
            notetakers: nylas,
            registry,
            jobs,
            tasks,
            media,
            oauth_states: Arc::new(StateManager::new()),
            wait_policies: WaitPolicies::default(),
        })
    }
}

/// The full application: routes plus the session and CORS layers.
pub fn app(app_state: AppState) -> Router {
    // Expiry is pinned per session at sign-in, see `auth_controller::callback`
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_http_only(true)
        .with_secure(app_state.config.secure_cookies())
        .with_same_site(SameSite::Lax);

    let origins = app_state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect::<Vec<HeaderValue>>();
    info!("CORS allowed origins: {:?}", app_state.config.allowed_origins);

    let cors_layer = CorsLayer::new()
        .allow_methods([Method::DELETE, Method::GET, Method::POST])
        .allow_credentials(true)
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .allow_origin(origins);

    router::define_routes(app_state)
        .layer(cors_layer)
        .layer(session_layer)
}

/// Serve until ctrl-c, then stop accepting connections and return.
///
/// Outstanding retrieval workers are the caller's to shut down.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let interface = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let server_url = format!("{}:{}", interface, app_state.config.port);
    let listener = TcpListener::bind(&server_url).await?;

    info!("Server starting... listening for connections on http://{server_url}");

    axum::serve(listener, app(app_state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, no longer accepting connections"),
        Err(e) => error!("Failed to listen for shutdown signal: {e}"),
    }
}

#[cfg(test)]
pub(crate) mod test_support;
