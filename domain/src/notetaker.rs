//! Notetaker lifecycle: dispatch a bot into a meeting, send it away, report its state.

use crate::error::{
    DomainErrorKind, Error, ExternalErrorKind, InternalErrorKind, RequestErrorKind,
};
use crate::grant::Grant;
use crate::meeting_link;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::*;
use meeting_ai::traits::{calendar, notetaker};
use meeting_ai::types::notetaker::Config;
use meeting_ai::{Notetaker, Status};

/// Ephemeral record of every notetaker this process has dispatched or heard about.
///
/// The registry is advisory: ids it has never seen (dispatched before a restart,
/// say) are still accepted by leave and retrieval.
#[derive(Default)]
pub struct NotetakerRegistry {
    notetakers: DashMap<String, Notetaker>,
    /// Ids with a leave request in flight upstream.
    leaving: DashMap<String, ()>,
}

impl NotetakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, notetaker: Notetaker) {
        self.notetakers.insert(notetaker.id.clone(), notetaker);
    }

    pub fn get(&self, notetaker_id: &str) -> Option<Notetaker> {
        self.notetakers.get(notetaker_id).map(|n| n.clone())
    }

    /// Move a known notetaker to `next`.
    ///
    /// Returns `None` for unknown ids, otherwise whether the transition was applied.
    pub fn advance(&self, notetaker_id: &str, next: Status) -> Option<bool> {
        let mut notetaker = self.notetakers.get_mut(notetaker_id)?;
        let from = notetaker.state;
        let applied = notetaker.advance(next);
        if applied {
            debug!("Notetaker {notetaker_id}: {from:?} -> {next:?}");
        } else if from != next {
            warn!("Ignoring illegal notetaker transition {notetaker_id}: {from:?} -> {next:?}");
        }
        Some(applied)
    }

    /// Reserve the one upstream leave call for `notetaker_id`.
    ///
    /// Rejected when the bot already left or another leave holds the claim. The
    /// claim is released when dropped, so a failed leave can be retried.
    pub fn claim_leave(&self, notetaker_id: &str) -> Result<LeaveClaim<'_>, Error> {
        match self.leaving.entry(notetaker_id.to_string()) {
            Entry::Occupied(_) => {
                info!("Notetaker {notetaker_id} is already leaving; not contacting upstream");
                Err(Error::invalid("Notetaker is already leaving the meeting"))
            }
            Entry::Vacant(entry) => {
                // Checked under the entry lock: a finished leave advances to Left
                // before it releases its claim.
                if self
                    .get(notetaker_id)
                    .is_some_and(|notetaker| notetaker.state.has_left())
                {
                    info!("Notetaker {notetaker_id} already left; not contacting upstream");
                    return Err(Error::invalid("Notetaker already left the meeting"));
                }
                entry.insert(());
                Ok(LeaveClaim {
                    registry: self,
                    notetaker_id: notetaker_id.to_string(),
                })
            }
        }
    }

    pub fn len(&self) -> usize {
        self.notetakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notetakers.is_empty()
    }
}

/// Exclusive right to send one notetaker away, see [`NotetakerRegistry::claim_leave`].
pub struct LeaveClaim<'a> {
    registry: &'a NotetakerRegistry,
    notetaker_id: String,
}

impl Drop for LeaveClaim<'_> {
    fn drop(&mut self) {
        self.registry.leaving.remove(&self.notetaker_id);
    }
}

/// Where the bot should go: an explicit link, or the link attached to a calendar event.
#[derive(Debug, Clone, PartialEq)]
pub enum MeetingTarget {
    Link(String),
    Event(String),
}

impl MeetingTarget {
    /// An explicit, non-blank link takes precedence over an event id.
    pub fn from_parts(meeting_link: Option<String>, event_id: Option<String>) -> Result<Self, Error> {
        let non_blank = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
        match (non_blank(meeting_link), non_blank(event_id)) {
            (Some(link), _) => Ok(MeetingTarget::Link(link)),
            (None, Some(event_id)) => Ok(MeetingTarget::Event(event_id)),
            (None, None) => Err(Error::invalid("Either meetingLink or eventId is required")),
        }
    }
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub notetaker: Notetaker,
    /// The id was recovered from an unexpected upstream answer rather than a clean success.
    pub recovered: bool,
}

pub async fn dispatch(
    notetakers: &dyn notetaker::Provider,
    calendar: &dyn calendar::Provider,
    registry: &NotetakerRegistry,
    grant: &Grant,
    target: MeetingTarget,
    display_name: &str,
) -> Result<Dispatch, Error> {
    let display_name = display_name.trim();
    if display_name.is_empty() {
        return Err(Error::invalid("Notetaker name is required"));
    }

    let (raw_link, event_id) = match target {
        MeetingTarget::Link(link) => (link, None),
        MeetingTarget::Event(event_id) => {
            let event = calendar.event(grant.expose(), &event_id).await?;
            let link = event.conferencing_url().map(str::to_string).ok_or_else(|| {
                info!("Event {event_id} has no conferencing URL");
                Error {
                    source: None,
                    error_kind: DomainErrorKind::Internal(InternalErrorKind::Request(
                        RequestErrorKind::NoConferencingUrl,
                    )),
                }
            })?;
            (link, Some(event_id))
        }
    };
    let meeting_link = meeting_link::normalize(&raw_link)?;

    debug!(
        "Dispatching notetaker to {meeting_link} for grant {}",
        grant.fingerprint()
    );

    let config = Config {
        meeting_link: meeting_link.clone(),
        notetaker_name: display_name.to_string(),
    };
    let created = match notetakers.create_notetaker(grant.expose(), config).await {
        Ok(created) => created,
        Err(err) => match recoverable_id(&err) {
            Some(id) => {
                info!("Recovered notetaker id {id} from upstream error response");
                meeting_ai::types::notetaker::Created::recovered(id)
            }
            None => {
                warn!("Failed to dispatch notetaker: {err}");
                return Err(err.into());
            }
        },
    };
    let recovered = created.recovered;

    let mut notetaker = Notetaker::new(
        created.notetaker_id,
        meeting_link,
        display_name.to_string(),
        event_id,
    );
    notetaker.advance(Status::Joining);
    registry.insert(notetaker.clone());
    info!("Notetaker {} is joining", notetaker.id);

    Ok(Dispatch {
        notetaker,
        recovered,
    })
}

/// Send a notetaker away.
///
/// A locally-known bot that already left, or one another request is already
/// sending away, is rejected without an upstream call.
pub async fn leave(
    notetakers: &dyn notetaker::Provider,
    registry: &NotetakerRegistry,
    grant: &Grant,
    notetaker_id: Option<&str>,
) -> Result<(), Error> {
    let notetaker_id = notetaker_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::invalid("Missing notetakerId"))?;

    let _claim = registry.claim_leave(notetaker_id)?;

    notetakers
        .remove_notetaker(grant.expose(), notetaker_id)
        .await
        .map_err(|e| {
            warn!("Failed to remove notetaker {notetaker_id}: {e}");
            Error::from(e)
        })?;

    registry.advance(notetaker_id, Status::Left);
    info!("Notetaker {notetaker_id} left the meeting");
    Ok(())
}

pub fn status(registry: &NotetakerRegistry, notetaker_id: &str) -> Result<Notetaker, Error> {
    registry
        .get(notetaker_id)
        .ok_or_else(|| Error::not_found(format!("Notetaker {notetaker_id} not found")))
}

/// Pull `"notetaker_id":"..."` out of an upstream body.
pub fn recover_notetaker_id(body: &str) -> Option<String> {
    const KEY: &str = "\"notetaker_id\":\"";
    let start = body.find(KEY)? + KEY.len();
    let rest = &body[start..];
    let id = &rest[..rest.find('"')?];
    (!id.is_empty()).then(|| id.to_string())
}

/// An id in a non-conflict error body. `AlreadyExists` stays an error even when it names the bot.
fn recoverable_id(err: &meeting_ai::Error) -> Option<String> {
    match err {
        meeting_ai::Error::Upstream { body, .. } | meeting_ai::Error::Unavailable { body, .. } => {
            recover_notetaker_id(body)
        }
        _ => None,
    }
}

/// True when the error is the distinct "a bot is already there" condition.
pub fn is_already_exists(err: &Error) -> bool {
    matches!(
        err.error_kind,
        DomainErrorKind::External(ExternalErrorKind::AlreadyExists { .. })
    )
}
