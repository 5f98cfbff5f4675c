//! This module holds typed parameters for various endpoint inputs.
//!
//! Query strings and JSON bodies are deserialized into these structs before any
//! handler logic runs. Everything is optional at this layer; the domain decides
//! which absences are errors so the messages stay consistent across endpoints.

pub(crate) mod auth;
pub(crate) mod calendar;
pub(crate) mod notetaker;
pub(crate) mod recording;
