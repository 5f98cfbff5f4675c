//! Nylas v3 API client for grants, calendars and notetaker bots.
//!
//! Every call authenticates with the application's API key as a bearer token.
//! Idempotent reads go through a client with transient-failure retries; bot
//! dispatch, bot removal and the code exchange go through one without, since
//! repeating them upstream is not safe.

use crate::error::Error;
use crate::notetaker::recover_notetaker_id;
use async_trait::async_trait;
use log::*;
use meeting_ai::traits::{account, calendar, notetaker};
use meeting_ai::types::account::{CodeExchange, GrantInfo};
use meeting_ai::types::calendar::{Event, TimeRange};
use meeting_ai::types::notetaker::{Config as NotetakerConfig, Created, Media};
use meeting_auth::api_key::{ApiKeyProvider, BearerTokenAuth};
use meeting_auth::http::{AuthenticatedClient, AuthenticatedClientBuilder};
use secrecy::SecretString;
use serde::Deserialize;
use service::config::Config;
use urlencoding::encode;

const PROVIDER_ID: &str = "nylas";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct CreatedNotetaker {
    #[serde(default)]
    notetaker_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

/// Media answers come in two shapes: a flat `recording_url`, or `data.recording.url`.
#[derive(Debug, Default, Deserialize)]
struct MediaResponse {
    #[serde(default)]
    recording_url: Option<String>,
    #[serde(default)]
    data: Option<MediaData>,
}

#[derive(Debug, Default, Deserialize)]
struct MediaData {
    #[serde(default)]
    recording: Option<MediaRecording>,
}

#[derive(Debug, Default, Deserialize)]
struct MediaRecording {
    #[serde(default)]
    url: Option<String>,
}

impl MediaResponse {
    fn into_media(self) -> Media {
        let nested = self
            .data
            .and_then(|data| data.recording)
            .and_then(|recording| recording.url);
        Media {
            recording_url: self.recording_url.or(nested),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    grant_id: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// Nylas v3 API client
pub struct NylasClient {
    reads: AuthenticatedClient,
    writes: AuthenticatedClient,
    plain: reqwest::Client,
    base_url: String,
}

impl NylasClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let api_key = config.nylas_api_key().ok_or_else(|| {
            error!("NYLAS_API_KEY is not configured");
            Error::config("Missing Nylas API key")
        })?;

        let build = |max_retries: u32| {
            AuthenticatedClientBuilder::new()
                .with_auth(Box::new(BearerTokenAuth::new(
                    ApiKeyProvider::Nylas,
                    SecretString::new(api_key.clone()),
                )))
                .with_timeout(config.upstream_timeout())
                .with_max_retries(max_retries)
                .build()
        };

        let plain = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.upstream_timeout())
            .build()?;

        Ok(Self {
            reads: build(config.upstream_max_retries)?,
            writes: build(0)?,
            plain,
            base_url: config.nylas_base_url().to_string(),
        })
    }

    fn grant_url(&self, grant_id: &str, path: &str) -> String {
        format!("{}/grants/{}{}", self.base_url, encode(grant_id), path)
    }
}

fn network_error(context: &str, err: impl std::fmt::Debug + std::fmt::Display) -> meeting_ai::Error {
    warn!("Nylas {context} request failed: {:?}", err);
    meeting_ai::Error::Network(err.to_string())
}

/// Turn a non-2xx Nylas answer into a provider error, keeping status and body.
async fn error_from_response(context: &str, response: reqwest::Response) -> meeting_ai::Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    warn!("Nylas {context} returned {status}: {body}");
    classify(status, body)
}

/// Nylas reports a bot already in (or on its way into) the meeting in plain words,
/// on error and success statuses alike.
fn mentions_existing_notetaker(body: &str) -> bool {
    body.contains("notetaker already exists") || body.contains("notetaker is joining meeting")
}

fn already_exists(body: String) -> meeting_ai::Error {
    meeting_ai::Error::AlreadyExists {
        notetaker_id: recover_notetaker_id(&body),
        body,
    }
}

fn classify(status: u16, body: String) -> meeting_ai::Error {
    if mentions_existing_notetaker(&body) {
        return already_exists(body);
    }
    match status {
        401 => meeting_ai::Error::Authentication(body),
        404 => meeting_ai::Error::NotFound(body),
        502..=504 => meeting_ai::Error::Unavailable { status, body },
        _ => meeting_ai::Error::Upstream { status, body },
    }
}

async fn parse<T: serde::de::DeserializeOwned>(
    context: &str,
    response: reqwest::Response,
) -> Result<T, meeting_ai::Error> {
    response.json::<T>().await.map_err(|e| {
        warn!("Failed to parse Nylas {context} response: {:?}", e);
        meeting_ai::Error::MalformedResponse(format!("Invalid {context} response from Nylas"))
    })
}

/// Read the bot id out of a 2xx creation answer.
///
/// Order matters: the "already there" wording wins over any id in the body, then
/// the `data` envelope, then an id found anywhere in the text.
fn created_from_success(body: String) -> Result<Created, meeting_ai::Error> {
    if mentions_existing_notetaker(&body) {
        warn!("Nylas notetaker creation succeeded with an existing-bot answer: {body}");
        return Err(already_exists(body));
    }

    let enveloped = serde_json::from_str::<Envelope<CreatedNotetaker>>(&body)
        .ok()
        .and_then(|created| created.data.notetaker_id.or(created.data.id))
        .filter(|id| !id.is_empty());
    if let Some(notetaker_id) = enveloped {
        info!("Created Nylas notetaker with ID: {notetaker_id}");
        return Ok(Created::new(notetaker_id));
    }

    match recover_notetaker_id(&body) {
        Some(notetaker_id) => {
            info!("Recovered Nylas notetaker ID {notetaker_id} from an unexpected creation answer");
            Ok(Created::recovered(notetaker_id))
        }
        None => {
            warn!("Nylas notetaker creation answer carried no notetaker_id: {body}");
            Err(meeting_ai::Error::MalformedResponse(
                "No notetaker_id in creation response".to_string(),
            ))
        }
    }
}

#[async_trait]
impl account::Provider for NylasClient {
    async fn exchange_code(&self, exchange: CodeExchange) -> Result<GrantInfo, meeting_ai::Error> {
        let url = format!("{}/connect/token", self.base_url);
        debug!("Exchanging authorization code with Nylas");

        let response = self
            .writes
            .post(&url)
            .json(&exchange)
            .send()
            .await
            .map_err(|e| network_error("token exchange", e))?;

        if !response.status().is_success() {
            return Err(error_from_response("token exchange", response).await);
        }

        let token: TokenResponse = parse("token exchange", response).await?;
        let grant_id = token.grant_id.filter(|id| !id.is_empty()).ok_or_else(|| {
            warn!("Nylas token response carried no grant_id");
            meeting_ai::Error::MalformedResponse("No grant_id in token response".to_string())
        })?;
        Ok(GrantInfo {
            grant_id,
            email: token.email,
        })
    }

    async fn grant_is_valid(&self, grant_id: &str) -> bool {
        match self.reads.get(self.grant_url(grant_id, "")).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Grant liveness probe failed: {:?}", e);
                false
            }
        }
    }

    async fn probe_authorization(&self, authorization_url: &str) -> Result<(), meeting_ai::Error> {
        let response = self
            .plain
            .get(authorization_url)
            .send()
            .await
            .map_err(|e| network_error("hosted auth probe", e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response("hosted auth probe", response).await)
        }
    }
}

#[async_trait]
impl calendar::Provider for NylasClient {
    async fn events(
        &self,
        grant_id: &str,
        range: &TimeRange,
    ) -> Result<Vec<serde_json::Value>, meeting_ai::Error> {
        let response = self
            .reads
            .get(self.grant_url(grant_id, "/events"))
            .query(&[
                ("calendar_id", "primary"),
                ("start", range.start.as_str()),
                ("end", range.end.as_str()),
            ])
            .send()
            .await
            .map_err(|e| network_error("event listing", e))?;

        if !response.status().is_success() {
            return Err(error_from_response("event listing", response).await);
        }

        let events: Envelope<Vec<serde_json::Value>> = parse("event listing", response).await?;
        debug!("Fetched {} calendar event(s)", events.data.len());
        Ok(events.data)
    }

    async fn event(&self, grant_id: &str, event_id: &str) -> Result<Event, meeting_ai::Error> {
        let response = self
            .reads
            .get(self.grant_url(grant_id, &format!("/events/{}", encode(event_id))))
            .query(&[("calendar_id", "primary")])
            .send()
            .await
            .map_err(|e| network_error("event lookup", e))?;

        if !response.status().is_success() {
            return Err(error_from_response("event lookup", response).await);
        }

        let event: Envelope<Event> = parse("event lookup", response).await?;
        Ok(event.data)
    }
}

#[async_trait]
impl notetaker::Provider for NylasClient {
    async fn create_notetaker(
        &self,
        grant_id: &str,
        config: NotetakerConfig,
    ) -> Result<Created, meeting_ai::Error> {
        debug!("Creating Nylas notetaker for meeting: {}", config.meeting_link);

        let response = self
            .writes
            .post(self.grant_url(grant_id, "/notetakers"))
            .json(&config)
            .send()
            .await
            .map_err(|e| network_error("notetaker creation", e))?;

        if !response.status().is_success() {
            return Err(error_from_response("notetaker creation", response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| network_error("notetaker creation", e))?;
        created_from_success(body)
    }

    async fn remove_notetaker(
        &self,
        grant_id: &str,
        notetaker_id: &str,
    ) -> Result<(), meeting_ai::Error> {
        let response = self
            .writes
            .delete(self.grant_url(grant_id, &format!("/notetakers/{}", encode(notetaker_id))))
            .send()
            .await
            .map_err(|e| network_error("notetaker removal", e))?;

        if response.status().is_success() {
            info!("Removed Nylas notetaker: {notetaker_id}");
            Ok(())
        } else {
            Err(error_from_response("notetaker removal", response).await)
        }
    }

    async fn media(&self, grant_id: &str, notetaker_id: &str) -> Result<Media, meeting_ai::Error> {
        let response = self
            .reads
            .get(self.grant_url(
                grant_id,
                &format!("/notetakers/{}/media", encode(notetaker_id)),
            ))
            .send()
            .await
            .map_err(|e| network_error("media lookup", e))?;

        if !response.status().is_success() {
            return Err(error_from_response("media lookup", response).await);
        }

        let media: MediaResponse = parse("media lookup", response).await?;
        Ok(media.into_media())
    }

    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, InternalErrorKind};
    use meeting_ai::traits::account::Provider as _;
    use meeting_ai::traits::calendar::Provider as _;
    use meeting_ai::traits::notetaker::Provider as _;
    use mockito::{Matcher, Server, ServerGuard};
    use serial_test::serial;

    fn client_for(server: &ServerGuard) -> NylasClient {
        let mut config = Config::default()
            .set_nylas_base_url(server.url())
            .set_nylas_api_key("nyk_test".to_string());
        config.upstream_max_retries = 0;
        NylasClient::new(&config).unwrap()
    }

    fn notetaker_config() -> NotetakerConfig {
        NotetakerConfig {
            meeting_link: "https://zoom.us/j/123".to_string(),
            notetaker_name: "Scribe".to_string(),
        }
    }

    #[tokio::test]
    #[serial]
    async fn create_notetaker_posts_link_and_name() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/grants/g1/notetakers")
            .match_header("authorization", "Bearer nyk_test")
            .match_body(Matcher::Json(serde_json::json!({
                "meeting_link": "https://zoom.us/j/123",
                "notetaker_name": "Scribe"
            })))
            .with_status(200)
            .with_body(r#"{"data":{"notetaker_id":"nt1"}}"#)
            .create_async()
            .await;

        let created = client_for(&server)
            .create_notetaker("g1", notetaker_config())
            .await
            .unwrap();

        assert_eq!(created, Created::new("nt1"));
        mock.assert_async().await;
    }

    #[tokio::test]
    #[serial]
    async fn duplicate_notetaker_is_already_exists_with_id() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/grants/g1/notetakers")
            .with_status(400)
            .with_body(r#"{"error":{"message":"notetaker already exists"},"notetaker_id":"nt1"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .create_notetaker("g1", notetaker_config())
            .await
            .unwrap_err();

        match err {
            meeting_ai::Error::AlreadyExists { notetaker_id, .. } => {
                assert_eq!(notetaker_id.as_deref(), Some("nt1"))
            }
            other => panic!("expected AlreadyExists, got {other:?}"),
        }
    }

    #[tokio::test]
    #[serial]
    async fn joining_notetaker_is_already_exists() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/grants/g1/notetakers")
            .with_status(400)
            .with_body(r#"{"error":{"message":"notetaker is joining meeting, please wait..."}}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .create_notetaker("g1", notetaker_config())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            meeting_ai::Error::AlreadyExists {
                notetaker_id: None,
                ..
            }
        ));
    }

    #[tokio::test]
    #[serial]
    async fn joining_answer_with_success_status_is_already_exists() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/grants/g1/notetakers")
            .with_status(200)
            .with_header("content-type", "text/plain")
            .with_body("notetaker is joining meeting, please wait...")
            .create_async()
            .await;

        let err = client_for(&server)
            .create_notetaker("g1", notetaker_config())
            .await
            .unwrap_err();

        assert!(matches!(err, meeting_ai::Error::AlreadyExists { .. }));
    }

    #[tokio::test]
    #[serial]
    async fn id_outside_data_envelope_is_recovered() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/grants/g1/notetakers")
            .with_status(200)
            .with_body(r#"{"notetaker_id":"nt7","state":"scheduled"}"#)
            .create_async()
            .await;

        let created = client_for(&server)
            .create_notetaker("g1", notetaker_config())
            .await
            .unwrap();

        assert_eq!(created, Created::recovered("nt7"));
    }

    #[tokio::test]
    #[serial]
    async fn success_without_any_id_is_malformed() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/grants/g1/notetakers")
            .with_status(200)
            .with_body(r#"{"data":{"state":"scheduled"}}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .create_notetaker("g1", notetaker_config())
            .await
            .unwrap_err();

        assert!(matches!(err, meeting_ai::Error::MalformedResponse(_)));
    }

    #[tokio::test]
    #[serial]
    async fn remove_notetaker_issues_delete() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/grants/g1/notetakers/nt1")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        client_for(&server)
            .remove_notetaker("g1", "nt1")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    #[serial]
    async fn media_accepts_flat_and_nested_locators() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/grants/g1/notetakers/nt1/media")
            .with_status(200)
            .with_body(r#"{"recording_url":"https://storage/flat.webm"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/grants/g1/notetakers/nt2/media")
            .with_status(200)
            .with_body(r#"{"data":{"recording":{"url":"https://storage/nested.webm"}}}"#)
            .create_async()
            .await;
        let client = client_for(&server);

        assert_eq!(
            client.media("g1", "nt1").await.unwrap().recording_url.as_deref(),
            Some("https://storage/flat.webm")
        );
        assert_eq!(
            client.media("g1", "nt2").await.unwrap().recording_url.as_deref(),
            Some("https://storage/nested.webm")
        );
    }

    #[tokio::test]
    #[serial]
    async fn missing_media_is_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/grants/g1/notetakers/nt1/media")
            .with_status(404)
            .with_body(r#"{"error":"not found"}"#)
            .create_async()
            .await;

        let err = client_for(&server).media("g1", "nt1").await.unwrap_err();
        assert!(matches!(err, meeting_ai::Error::NotFound(_)));
    }

    #[tokio::test]
    #[serial]
    async fn event_lookup_reads_primary_calendar() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/grants/g1/events/evt1")
            .match_query(Matcher::UrlEncoded("calendar_id".into(), "primary".into()))
            .with_status(200)
            .with_body(
                r#"{"data":{"id":"evt1","conferencing":{"details":{"url":"https://zoom.us/j/9"}}}}"#,
            )
            .create_async()
            .await;

        let event = client_for(&server).event("g1", "evt1").await.unwrap();
        assert_eq!(event.conferencing_url(), Some("https://zoom.us/j/9"));
    }

    #[tokio::test]
    #[serial]
    async fn events_are_listed_for_the_range() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/grants/g1/events")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("calendar_id".into(), "primary".into()),
                Matcher::UrlEncoded("start".into(), "1700000000".into()),
                Matcher::UrlEncoded("end".into(), "1700086400".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"data":[{"id":"a"},{"id":"b"}]}"#)
            .create_async()
            .await;

        let range = TimeRange {
            start: "1700000000".to_string(),
            end: "1700086400".to_string(),
        };
        let events = client_for(&server).events("g1", &range).await.unwrap();
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    #[serial]
    async fn code_exchange_requires_grant_id() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/connect/token")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "code": "abc",
                "code_verifier": "nylas",
                "grant_type": "authorization_code"
            })))
            .with_status(200)
            .with_body(r#"{"access_token":"x"}"#)
            .create_async()
            .await;

        let exchange = CodeExchange::new("client", "nyk_test", "http://app/cb", "abc", "nylas");
        let err = client_for(&server).exchange_code(exchange).await.unwrap_err();
        assert!(matches!(err, meeting_ai::Error::MalformedResponse(_)));
    }

    #[tokio::test]
    #[serial]
    async fn code_exchange_returns_grant() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/connect/token")
            .with_status(200)
            .with_body(r#"{"grant_id":"g1","email":"a@b.c"}"#)
            .create_async()
            .await;

        let exchange = CodeExchange::new("client", "nyk_test", "http://app/cb", "abc", "nylas");
        let info = client_for(&server).exchange_code(exchange).await.unwrap();
        assert_eq!(info.grant_id, "g1");
    }

    #[tokio::test]
    #[serial]
    async fn grant_probe_is_false_on_rejection() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/grants/g1")
            .with_status(401)
            .create_async()
            .await;
        server
            .mock("GET", "/grants/g2")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let client = client_for(&server);

        assert!(!client.grant_is_valid("g1").await);
        assert!(client.grant_is_valid("g2").await);
    }

    #[tokio::test]
    #[serial]
    async fn auth_probe_gateway_error_is_unavailable() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/connect/auth")
            .match_query(Matcher::Any)
            .with_status(502)
            .create_async()
            .await;

        let err = client_for(&server)
            .probe_authorization(&format!("{}/connect/auth?client_id=c", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            meeting_ai::Error::Unavailable { status: 502, .. }
        ));
    }

    #[test]
    #[serial]
    fn missing_api_key_is_config_error() {
        let _guard = EnvGuard::remove("NYLAS_API_KEY");
        let err = NylasClient::new(&Config::default()).err().unwrap();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Config)
        );
    }

    /// Restores an environment variable when dropped.
    struct EnvGuard {
        key: &'static str,
        saved: Option<String>,
    }

    impl EnvGuard {
        fn remove(key: &'static str) -> Self {
            let saved = std::env::var(key).ok();
            std::env::remove_var(key);
            EnvGuard { key, saved }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.saved {
                std::env::set_var(self.key, value);
            }
        }
    }
}
