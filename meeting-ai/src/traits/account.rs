//! Account (grant) provider trait.

use crate::types::account::{CodeExchange, GrantInfo};
use crate::Error;
use async_trait::async_trait;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Trade an authorization code for a grant.
    async fn exchange_code(&self, exchange: CodeExchange) -> Result<GrantInfo, Error>;

    /// Liveness probe for a grant. Any failure, including network errors, is `false`.
    async fn grant_is_valid(&self, grant_id: &str) -> bool;

    /// Check that the hosted authentication page is reachable.
    ///
    /// Returns `Error::Unavailable` when the provider answers with a gateway error.
    async fn probe_authorization(&self, authorization_url: &str) -> Result<(), Error>;
}
