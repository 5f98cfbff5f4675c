use crate::extractors::RejectionType;
use crate::Error;
use axum::{extract::FromRequestParts, http::request::Parts};
use domain::grant::Grant;
use log::*;
use tower_sessions::Session;

/// Session key holding the caller's grant id.
pub(crate) const GRANT_ID_KEY: &str = "grant_id";

/// The grant stored in the caller's session, if there is one.
pub(crate) struct SessionGrant(pub Option<Grant>);

impl SessionGrant {
    /// The session grant, falling back to a `grantId` the caller sent explicitly.
    pub(crate) fn or_explicit(self, grant_id: Option<&str>) -> Result<Grant, Error> {
        match self.0 {
            Some(grant) => Ok(grant),
            None => Ok(Grant::new(grant_id.unwrap_or_default())?),
        }
    }
}

impl<S> FromRequestParts<S> for SessionGrant
where
    S: Send + Sync,
{
    type Rejection = RejectionType;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(status, msg)| (status, msg.to_string()))?;

        let grant_id = match session.get::<String>(GRANT_ID_KEY).await {
            Ok(grant_id) => grant_id,
            Err(e) => {
                warn!("Failed to read grant from session: {:?}", e);
                None
            }
        };

        Ok(SessionGrant(grant_id.and_then(|id| Grant::new(id).ok())))
    }
}
