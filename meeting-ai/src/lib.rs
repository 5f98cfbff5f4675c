//! Provider-agnostic abstractions for meeting notetakers.
//!
//! This crate describes what the relay needs from an upstream meeting platform:
//! - Accounts: exchanging an authorization code for a grant and probing it
//! - Calendars: listing events and resolving an event's conferencing link
//! - Notetakers: dispatching a bot into a call, removing it, and locating its media
//!
//! It also owns the notetaker lifecycle status and its legal transitions. The
//! design lets the relay swap providers without touching domain or web code.

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::Error;
pub use types::notetaker::{Notetaker, Status};
