use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Response header carrying the API version this server speaks.
pub(crate) const X_VERSION: &str = "x-version";

/// GET health of the relay
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "API router is up and responding to requests", body = String,
            headers(("x-version" = String, description = "API version served"))),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn health_check(State(app_state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(X_VERSION, app_state.config.api_version().to_string())],
        "healthy",
    )
}
