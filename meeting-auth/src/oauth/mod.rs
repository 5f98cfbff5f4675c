//! OAuth 2.0 hosted-authentication support.
//!
//! The upstream provider hosts the consent screen; the relay only builds the
//! authorization URL, guards the round trip with a CSRF `state`, and binds the
//! later code exchange to a PKCE verifier.

mod authorize;
mod pkce;
mod state;

pub use authorize::AuthorizationRequest;
pub use pkce::{PkceChallenge, PkceVerifier};
pub use state::{StateData, StateManager};
