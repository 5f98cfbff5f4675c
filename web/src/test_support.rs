//! Shared fixtures for router tests: an app wired against a mock Nylas server.

use crate::{app, AppState, WaitPolicies};
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use domain::job::{InMemoryJobStore, TaskRegistry};
use domain::polling::PollPolicy;
use http_body_util::BodyExt;
use service::config::Config;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub(crate) const WEBHOOK_SECRET: &str = "hook-secret";

pub(crate) fn config_for(nylas_url: &str) -> Config {
    let mut config = Config::default()
        .set_nylas_base_url(nylas_url.to_string())
        .set_nylas_api_key("nyk_test".to_string())
        .set_nylas_client_id("client-1".to_string())
        .set_webhook_secret(WEBHOOK_SECRET.to_string())
        .set_download_token_secret("download-secret".to_string());
    config.upstream_max_retries = 0;
    config
}

pub(crate) fn state_for(config: Config) -> AppState {
    let store = Arc::new(InMemoryJobStore::new(config.job_retention()));
    let mut app_state = AppState::new(config, TaskRegistry::new(), store).unwrap();
    let quick = PollPolicy::fixed(Duration::from_millis(10), 200);
    app_state.wait_policies = WaitPolicies {
        share: PollPolicy::fixed(Duration::from_millis(10), 3),
        download: quick,
    };
    app_state
}

pub(crate) fn app_for(nylas_url: &str) -> (AppState, Router) {
    let app_state = state_for(config_for(nylas_url));
    (app_state.clone(), app(app_state))
}

pub(crate) async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub(crate) fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub(crate) fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub(crate) fn post_json(uri: &str, cookie: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub(crate) async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub(crate) async fn json_body(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// The `name=value` pair of the session cookie a response set.
pub(crate) fn session_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}
