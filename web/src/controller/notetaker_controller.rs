use crate::extractors::session_grant::SessionGrant;
use crate::params::notetaker::{
    DispatchParams, DispatchResponse, LeaveParams, LeaveQuery, NotetakerResponse, StatusParams,
    SuccessResponse,
};
use crate::{AppState, Error};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::notetaker::{self as NotetakerApi, MeetingTarget};
use log::*;

/// POST send a notetaker into a meeting
#[utoipa::path(
    post,
    path = "/api/notetakers",
    request_body = DispatchParams,
    responses(
        (status = 200, description = "Notetaker dispatched and joining", body = DispatchResponse),
        (status = 400, description = "Missing link, missing name, or event without a conferencing URL"),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "A notetaker is already in this meeting"),
        (status = 502, description = "Nylas is unavailable, try again later"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    session_grant: SessionGrant,
    Json(params): Json<DispatchParams>,
) -> Result<impl IntoResponse, Error> {
    let grant = session_grant.or_explicit(params.grant_id.as_deref())?;
    let target = MeetingTarget::from_parts(params.meeting_link, params.event_id)?;
    debug!("POST dispatch notetaker to {:?}", target);

    let dispatch = NotetakerApi::dispatch(
        app_state.notetakers.as_ref(),
        app_state.calendar.as_ref(),
        &app_state.registry,
        &grant,
        target,
        &params.notetaker_name,
    )
    .await?;

    Ok(Json(DispatchResponse {
        success: true,
        notetaker_id: dispatch.notetaker.id.clone(),
        recovered: dispatch.recovered,
        notetaker: dispatch.notetaker.into(),
    }))
}

/// GET the locally tracked state of a notetaker
#[utoipa::path(
    get,
    path = "/api/notetakers/{id}",
    params(
        ("id" = String, Path, description = "Notetaker id to look up"),
        StatusParams,
    ),
    responses(
        (status = 200, description = "Notetaker found", body = NotetakerResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Notetaker not known to this server"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn read(
    State(app_state): State<AppState>,
    session_grant: SessionGrant,
    Path(id): Path<String>,
    Query(params): Query<StatusParams>,
) -> Result<impl IntoResponse, Error> {
    session_grant.or_explicit(params.grant_id.as_deref())?;
    debug!("GET notetaker {id}");

    let notetaker = NotetakerApi::status(&app_state.registry, &id)?;
    Ok(Json(NotetakerResponse::from(notetaker)))
}

/// POST make a notetaker leave its meeting
///
/// The body is parsed leniently so `navigator.sendBeacon` payloads (sent as
/// `text/plain`) are accepted alongside JSON.
#[utoipa::path(
    post,
    path = "/api/notetakers/leave",
    params(LeaveQuery),
    request_body = LeaveParams,
    responses(
        (status = 200, description = "Notetaker left the meeting", body = SuccessResponse),
        (status = 202, description = "Best-effort leave scheduled", body = SuccessResponse),
        (status = 400, description = "Missing notetakerId, or the notetaker already left"),
        (status = 401, description = "Not authenticated"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn leave(
    State(app_state): State<AppState>,
    session_grant: SessionGrant,
    Query(query): Query<LeaveQuery>,
    body: Bytes,
) -> Result<impl IntoResponse, Error> {
    let params: LeaveParams = if body.is_empty() {
        LeaveParams::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            debug!("Unparseable leave body: {e}");
            Error::bad_request("Invalid request body")
        })?
    };
    let grant = session_grant.or_explicit(params.grant_id.as_deref())?;

    if query.beacon {
        debug!("POST leave (beacon) for {:?}", params.notetaker_id);
        let notetakers = app_state.notetakers.clone();
        let registry = app_state.registry.clone();
        app_state.tasks.spawn_background(move |_shutdown| async move {
            if let Err(e) = NotetakerApi::leave(
                notetakers.as_ref(),
                &registry,
                &grant,
                params.notetaker_id.as_deref(),
            )
            .await
            {
                warn!("Best-effort leave failed: {:?}", e.error_kind);
            }
        });
        return Ok((StatusCode::ACCEPTED, Json(SuccessResponse { success: true })));
    }

    NotetakerApi::leave(
        app_state.notetakers.as_ref(),
        &app_state.registry,
        &grant,
        params.notetaker_id.as_deref(),
    )
    .await?;

    Ok((StatusCode::OK, Json(SuccessResponse { success: true })))
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use domain::Status;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn dispatch_normalizes_link_and_reports_joining_notetaker() {
        let mut server = Server::new_async().await;
        let creation = server
            .mock("POST", "/grants/g1/notetakers")
            .match_header("authorization", "Bearer nyk_test")
            .match_body(Matcher::Json(json!({
                "meeting_link": "https://zoom.us/j/123",
                "notetaker_name": "Scribe"
            })))
            .with_status(200)
            .with_body(r#"{"data":{"notetaker_id":"nt1"}}"#)
            .create_async()
            .await;
        let (_, app) = app_for(&server.url());

        let response = send(
            &app,
            post_json(
                "/api/notetakers",
                None,
                json!({"meetingLink": "Join here: https://zoom.us/j/123 (passcode 42)", "notetakerName": "Scribe", "grantId": "g1"}),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["notetakerId"], "nt1");
        assert_eq!(body["recovered"], false);
        assert_eq!(body["notetaker"]["state"], "joining");
        creation.assert_async().await;
    }

    #[tokio::test]
    async fn second_dispatch_to_same_meeting_is_a_conflict() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/grants/g1/notetakers")
            .with_status(200)
            .with_body(r#"{"data":{"notetaker_id":"nt1"}}"#)
            .expect(1)
            .create_async()
            .await;
        let (_, app) = app_for(&server.url());
        let request = || {
            post_json(
                "/api/notetakers",
                None,
                json!({"meetingLink": "https://zoom.us/j/123", "notetakerName": "Scribe", "grantId": "g1"}),
            )
        };

        assert_eq!(send(&app, request()).await.status(), StatusCode::OK);

        server.reset_async().await;
        server
            .mock("POST", "/grants/g1/notetakers")
            .with_status(400)
            .with_body(r#"{"error":{"message":"notetaker already exists in this meeting"}}"#)
            .create_async()
            .await;

        let response = send(&app, request()).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn conflict_naming_the_existing_bot_stays_a_conflict() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/grants/g1/notetakers")
            .with_status(409)
            .with_body(
                r#"{"error":{"message":"notetaker already exists in this meeting"},"notetaker_id":"nt1"}"#,
            )
            .create_async()
            .await;
        let (app_state, app) = app_for(&server.url());

        let response = send(
            &app,
            post_json(
                "/api/notetakers",
                None,
                json!({"meetingLink": "https://zoom.us/j/123", "notetakerName": "Scribe", "grantId": "g1"}),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = json_body(response).await;
        assert_eq!(body["details"], "Existing notetaker: nt1");
        assert!(app_state.registry.get("nt1").is_none());
    }

    #[tokio::test]
    async fn event_without_conferencing_url_never_creates_a_notetaker() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/grants/g1/events/evt1")
            .match_query(Matcher::UrlEncoded("calendar_id".into(), "primary".into()))
            .with_status(200)
            .with_body(r#"{"data":{"id":"evt1","title":"Offline"}}"#)
            .create_async()
            .await;
        let creation = server
            .mock("POST", "/grants/g1/notetakers")
            .expect(0)
            .create_async()
            .await;
        let (_, app) = app_for(&server.url());

        let response = send(
            &app,
            post_json(
                "/api/notetakers",
                None,
                json!({"eventId": "evt1", "notetakerName": "Scribe", "grantId": "g1"}),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"],
            "No conferencing URL found for this event"
        );
        creation.assert_async().await;
    }

    #[tokio::test]
    async fn status_reports_registry_state() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/grants/g1/notetakers")
            .with_status(200)
            .with_body(r#"{"data":{"notetaker_id":"nt1"}}"#)
            .create_async()
            .await;
        let (app_state, app) = app_for(&server.url());
        send(
            &app,
            post_json(
                "/api/notetakers",
                None,
                json!({"meetingLink": "https://zoom.us/j/123", "notetakerName": "Scribe", "grantId": "g1"}),
            ),
        )
        .await;
        app_state.registry.advance("nt1", Status::Active);

        let response = send(&app, get("/api/notetakers/nt1?grantId=g1")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["state"], "active");
        assert_eq!(body["meetingLink"], "https://zoom.us/j/123");

        let response = send(&app, get("/api/notetakers/unknown?grantId=g1")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn leave_without_notetaker_id_never_reaches_nylas() {
        let mut server = Server::new_async().await;
        let removal = server
            .mock("DELETE", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let (_, app) = app_for(&server.url());

        let response = send(
            &app,
            post_json("/api/notetakers/leave", None, json!({"grantId": "g1"})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Missing notetakerId");
        removal.assert_async().await;
    }

    #[tokio::test]
    async fn second_leave_is_rejected_locally() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/grants/g1/notetakers")
            .with_status(200)
            .with_body(r#"{"data":{"notetaker_id":"nt1"}}"#)
            .create_async()
            .await;
        let removal = server
            .mock("DELETE", "/grants/g1/notetakers/nt1")
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;
        let (_, app) = app_for(&server.url());
        send(
            &app,
            post_json(
                "/api/notetakers",
                None,
                json!({"meetingLink": "https://zoom.us/j/123", "notetakerName": "Scribe", "grantId": "g1"}),
            ),
        )
        .await;
        let leave = || {
            post_json(
                "/api/notetakers/leave",
                None,
                json!({"notetakerId": "nt1", "grantId": "g1"}),
            )
        };

        assert_eq!(send(&app, leave()).await.status(), StatusCode::OK);
        let response = send(&app, leave()).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"],
            "Notetaker already left the meeting"
        );
        removal.assert_async().await;
    }

    #[tokio::test]
    async fn beacon_leave_answers_immediately_and_leaves_in_background() {
        let mut server = Server::new_async().await;
        let removal = server
            .mock("DELETE", "/grants/g1/notetakers/nt1")
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;
        let (app_state, app) = app_for(&server.url());

        // sendBeacon posts text/plain
        let request = Request::builder()
            .method("POST")
            .uri("/api/notetakers/leave?beacon=true")
            .header("content-type", "text/plain;charset=UTF-8")
            .body(Body::from(r#"{"notetakerId":"nt1","grantId":"g1"}"#))
            .unwrap();
        let response = send(&app, request).await;

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(app_state.tasks.shutdown(Duration::from_secs(5)).await);
        removal.assert_async().await;
    }
}
