//! Calendar provider trait.

use crate::types::calendar::{Event, TimeRange};
use crate::Error;
use async_trait::async_trait;

/// Read-only access to a grant's primary calendar.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Events on the primary calendar inside `range`, as raw provider JSON.
    async fn events(
        &self,
        grant_id: &str,
        range: &TimeRange,
    ) -> Result<Vec<serde_json::Value>, Error>;

    /// A single event on the primary calendar.
    async fn event(&self, grant_id: &str, event_id: &str) -> Result<Event, Error>;
}
