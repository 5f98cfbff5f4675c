use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query string Nylas appends when redirecting back after hosted authentication.
#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct CallbackParams {
    pub(crate) code: Option<String>,
    pub(crate) state: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthUrlResponse {
    pub(crate) auth_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CallbackResponse {
    pub(crate) success: bool,
    pub(crate) grant_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthCheckResponse {
    pub(crate) authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) grant_id: Option<String>,
}
