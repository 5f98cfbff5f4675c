use crate::extractors::session_grant::SessionGrant;
use crate::params::calendar::{EventsParams, EventsResponse};
use crate::{AppState, Error};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use domain::calendar as CalendarApi;
use log::*;

/// GET events on the primary calendar within a time window
#[utoipa::path(
    get,
    path = "/api/calendar/events",
    params(EventsParams),
    responses(
        (status = 200, description = "Events in the window", body = EventsResponse),
        (status = 400, description = "Missing or invalid start/end"),
        (status = 401, description = "Not authenticated"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    session_grant: SessionGrant,
    Query(params): Query<EventsParams>,
) -> Result<impl IntoResponse, Error> {
    let grant = session_grant.or_explicit(params.grant_id.as_deref())?;
    debug!("GET calendar events {:?}..{:?}", params.start, params.end);

    let events = CalendarApi::list_events(
        app_state.calendar.as_ref(),
        &grant,
        params.start.as_deref(),
        params.end.as_deref(),
    )
    .await?;

    Ok(Json(EventsResponse { events }))
}
