//! # meeting-auth
//!
//! Everything the relay needs to authenticate itself and its callers:
//! - API key authentication for the upstream notetaker provider (Nylas)
//! - HTTP client building with retry middleware
//! - OAuth CSRF state and PKCE for the hosted authentication flow
//! - Webhook shared-secret validation
//! - Signed, time-boxed capability tokens for recording downloads
//!
//! ## Usage
//!
//! ```rust,ignore
//! use meeting_auth::{
//!     api_key::{ApiKeyProvider, BearerTokenAuth},
//!     capability::TokenSigner,
//!     http::AuthenticatedClientBuilder,
//! };
//! ```

pub mod api_key;
pub mod capability;
pub mod error;
pub mod http;
pub mod oauth;
pub mod webhook;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
