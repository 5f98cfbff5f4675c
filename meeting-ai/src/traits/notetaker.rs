//! Notetaker provider trait.

use crate::types::notetaker::{Config, Created, Media};
use crate::Error;
use async_trait::async_trait;

/// Abstraction for services that send a notetaker bot into a live meeting.
///
/// Every call is scoped to a grant: the connected account the bot acts on behalf of.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Dispatch a bot into the meeting at `config.meeting_link` and return its id.
    ///
    /// Bot creation is not idempotent upstream. Implementations must not retry it.
    /// A bot already present in (or joining) the meeting is always reported as
    /// `Error::AlreadyExists`, never as a success.
    async fn create_notetaker(&self, grant_id: &str, config: Config) -> Result<Created, Error>;

    /// Ask the bot to leave the meeting. The recording keeps processing upstream.
    async fn remove_notetaker(&self, grant_id: &str, notetaker_id: &str) -> Result<(), Error>;

    /// Locate the recording for a notetaker. `Error::NotFound` means no media yet.
    async fn media(&self, grant_id: &str, notetaker_id: &str) -> Result<Media, Error>;

    /// Unique identifier for this provider (e.g. "nylas").
    fn provider_id(&self) -> &str;
}
