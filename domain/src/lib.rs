//! Business logic of the notetaker relay.
//!
//! Request handlers in `web` call into this crate; this crate calls upstream
//! through the provider traits from `meeting-ai`, implemented here by the Nylas
//! gateway. Job and notetaker state lives only in memory.

pub use meeting_ai::traits as providers;
pub use meeting_ai::types;
pub use meeting_ai::{Notetaker, Status};

pub mod calendar;
pub mod download_token;
pub mod error;
pub mod grant;
pub mod job;
pub mod meeting_link;
pub mod notetaker;
pub mod polling;
pub mod recording;
pub mod webhook;

pub mod gateway;

#[cfg(test)]
mod test_support;
