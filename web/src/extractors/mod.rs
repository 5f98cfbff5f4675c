pub(crate) mod session_grant;

use axum::http::StatusCode;

type RejectionType = (StatusCode, String);
