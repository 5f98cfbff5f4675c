use crate::extractors::session_grant::{SessionGrant, GRANT_ID_KEY};
use crate::params::auth::{AuthCheckResponse, AuthUrlResponse, CallbackParams, CallbackResponse};
use crate::{AppState, Error};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use domain::grant as GrantApi;
use log::*;
use tower_sessions::{Expiry, Session};

/// POST start hosted authentication with Nylas
#[utoipa::path(
    post,
    path = "/api/auth",
    responses(
        (status = 200, description = "Hosted authentication URL to send the user to", body = AuthUrlResponse),
        (status = 502, description = "Nylas is unavailable, try again later"),
        (status = 500, description = "Failed to connect to Nylas or missing configuration"),
    )
)]
pub async fn authorize(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let auth_url = GrantApi::begin_authorization(
        app_state.accounts.as_ref(),
        &app_state.config,
        &app_state.oauth_states,
    )
    .await?;

    debug!("Issued hosted authentication URL");
    Ok(Json(AuthUrlResponse { auth_url }))
}

/// GET exchange the authorization code and start a session
#[utoipa::path(
    get,
    path = "/api/auth/callback",
    params(CallbackParams),
    responses(
        (status = 200, description = "Grant stored in the session", body = CallbackResponse),
        (status = 400, description = "Missing code or unknown state"),
        (status = 500, description = "Code exchange failed"),
    )
)]
pub async fn callback(
    State(app_state): State<AppState>,
    session: Session,
    Query(params): Query<CallbackParams>,
) -> Result<impl IntoResponse, Error> {
    let grant = GrantApi::complete_authorization(
        app_state.accounts.as_ref(),
        &app_state.config,
        &app_state.oauth_states,
        params.code.as_deref(),
        params.state.as_deref(),
    )
    .await?;

    // A fresh session id on every sign-in
    session
        .cycle_id()
        .await
        .map_err(|e| Error::internal(e, "Failed to start session"))?;
    // Fixed window from sign-in; activity does not extend it
    session.set_expiry(Some(Expiry::AtDateTime(
        time::OffsetDateTime::now_utc()
            + time::Duration::days(app_state.config.session_expiry_days),
    )));
    session
        .insert(GRANT_ID_KEY, grant.expose().to_string())
        .await
        .map_err(|e| Error::internal(e, "Failed to store grant in session"))?;

    info!("Session started for grant {}", grant.fingerprint());
    Ok(Json(CallbackResponse {
        success: true,
        grant_id: grant.expose().to_string(),
    }))
}

/// GET whether the session holds a grant that Nylas still accepts
#[utoipa::path(
    get,
    path = "/api/auth/check",
    responses(
        (status = 200, description = "Authentication state of this session", body = AuthCheckResponse),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn check(
    State(app_state): State<AppState>,
    SessionGrant(grant): SessionGrant,
) -> impl IntoResponse {
    let response = match grant {
        Some(grant) if GrantApi::is_valid(app_state.accounts.as_ref(), &grant).await => {
            AuthCheckResponse {
                authenticated: true,
                grant_id: Some(grant.expose().to_string()),
            }
        }
        _ => AuthCheckResponse {
            authenticated: false,
            grant_id: None,
        },
    };
    Json(response)
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::http::StatusCode;
    use mockito::{Matcher, Server};

    fn post(uri: &str) -> axum::http::Request<axum::body::Body> {
        axum::http::Request::builder()
            .method("POST")
            .uri(uri)
            .body(axum::body::Body::empty())
            .unwrap()
    }

    fn query_value(url: &str, key: &str) -> String {
        let prefix = format!("{key}=");
        url.split(['?', '&'])
            .find_map(|pair| pair.strip_prefix(&prefix))
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn authorize_returns_probed_hosted_auth_url() {
        let mut server = Server::new_async().await;
        let probe = server
            .mock("GET", "/connect/auth")
            .match_query(Matcher::UrlEncoded("client_id".into(), "client-1".into()))
            .with_status(200)
            .create_async()
            .await;
        let (_, app) = app_for(&server.url());

        let response = send(&app, post("/api/auth")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let auth_url = body["authUrl"].as_str().unwrap();
        assert!(auth_url.starts_with(&format!("{}/connect/auth?", server.url())));
        assert!(auth_url.contains("code_challenge_method=S256"));
        probe.assert_async().await;
    }

    #[tokio::test]
    async fn authorize_reports_unavailable_nylas() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/connect/auth")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;
        let (_, app) = app_for(&server.url());

        let response = send(&app, post("/api/auth")).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("try again later"));
    }

    #[tokio::test]
    async fn callback_without_code_is_bad_request() {
        let server = Server::new_async().await;
        let (_, app) = app_for(&server.url());

        let response = send(&app, get("/api/auth/callback")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"],
            "No authorization code provided"
        );
    }

    #[tokio::test]
    async fn callback_stores_grant_and_check_confirms_it() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/connect/token")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "code": "abc",
                "grant_type": "authorization_code",
                "code_verifier": "nylas",
                "client_id": "client-1",
                "client_secret": "nyk_test"
            })))
            .with_status(200)
            .with_body(r#"{"grant_id":"g1","email":"user@example.com"}"#)
            .create_async()
            .await;
        let liveness = server
            .mock("GET", "/grants/g1")
            .with_status(200)
            .with_body(r#"{"data":{"id":"g1"}}"#)
            .create_async()
            .await;
        let (_, app) = app_for(&server.url());

        let response = send(&app, get("/api/auth/callback?code=abc")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["grantId"], "g1");

        let response = send(&app, get_with_cookie("/api/auth/check", &cookie)).await;
        let body = json_body(response).await;
        assert_eq!(body["authenticated"], true);
        assert_eq!(body["grantId"], "g1");
        liveness.assert_async().await;
    }

    #[tokio::test]
    async fn session_window_is_fixed_at_sign_in() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/connect/token")
            .with_status(200)
            .with_body(r#"{"grant_id":"g1"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/grants/g1")
            .with_status(200)
            .with_body(r#"{"data":{"id":"g1"}}"#)
            .create_async()
            .await;
        let (_, app) = app_for(&server.url());

        let response = send(&app, get("/api/auth/callback?code=abc")).await;
        let set_cookie = response.headers()[axum::http::header::SET_COOKIE]
            .to_str()
            .unwrap()
            .to_string();
        let max_age: i64 = set_cookie
            .split("; ")
            .find_map(|attribute| attribute.strip_prefix("Max-Age="))
            .unwrap()
            .parse()
            .unwrap();
        let day = 24 * 60 * 60;
        assert!(max_age > 29 * day && max_age <= 30 * day, "{set_cookie}");

        // Activity neither refreshes the cookie nor extends the window
        let cookie = session_cookie(&response);
        let response = send(&app, get_with_cookie("/api/auth/check", &cookie)).await;
        assert!(response
            .headers()
            .get(axum::http::header::SET_COOKIE)
            .is_none());
        assert_eq!(json_body(response).await["authenticated"], true);
    }

    #[tokio::test]
    async fn callback_sends_the_verifier_issued_with_its_state() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/connect/auth")
            .match_query(Matcher::Any)
            .with_status(200)
            .create_async()
            .await;
        let (_, app) = app_for(&server.url());

        let body = json_body(send(&app, post("/api/auth")).await).await;
        let state = query_value(body["authUrl"].as_str().unwrap(), "state");

        let exchange = server
            .mock("POST", "/connect/token")
            .match_body(Matcher::Regex(r#""code_verifier":"[A-Za-z0-9_-]{43,128}""#.into()))
            .with_status(200)
            .with_body(r#"{"grant_id":"g1"}"#)
            .create_async()
            .await;

        let response = send(&app, get(&format!("/api/auth/callback?code=abc&state={state}"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        exchange.assert_async().await;

        // States are single use
        let response = send(&app, get(&format!("/api/auth/callback?code=abc&state={state}"))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejected_exchange_is_a_server_error_with_upstream_detail() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/connect/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;
        let (_, app) = app_for(&server.url());

        let response = send(&app, get("/api/auth/callback?code=stale")).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert!(body["details"].as_str().unwrap().contains("invalid_grant"));
    }

    #[tokio::test]
    async fn check_without_session_is_unauthenticated() {
        let server = Server::new_async().await;
        let (_, app) = app_for(&server.url());

        let response = send(&app, get("/api/auth/check")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"authenticated": false})
        );
    }
}
