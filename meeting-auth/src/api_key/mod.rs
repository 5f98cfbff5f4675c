//! API key authentication for the upstream provider.
//!
//! The relay authenticates every upstream call with a server-side key that is
//! never sent to browsers.

mod bearer;
mod provider;

pub use bearer::BearerTokenAuth;
pub use provider::{ApiKeyProvider, AuthMethod, ProviderAuth};
