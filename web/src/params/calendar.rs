use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Time window, in Unix seconds, to list events for.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventsParams {
    pub(crate) start: Option<String>,
    pub(crate) end: Option<String>,
    pub(crate) grant_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct EventsResponse {
    /// Events exactly as Nylas returned them
    #[schema(value_type = Vec<Object>)]
    pub(crate) events: Vec<serde_json::Value>,
}
