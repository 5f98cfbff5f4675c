//! HTTP clients for upstream services.

pub mod media;
pub mod nylas;
