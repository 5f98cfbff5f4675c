//! Grants: the opaque credential naming one authorized upstream account.
//!
//! A grant is obtained through the hosted authentication flow and stored in the
//! caller's session. Log lines refer to it only through [`Grant::fingerprint`].

use crate::error::{DomainErrorKind, Error, ExternalErrorKind};
use log::*;
use meeting_ai::traits::account;
use meeting_ai::types::account::CodeExchange;
use meeting_auth::oauth::{AuthorizationRequest, StateManager};
use secrecy::{ExposeSecret, SecretString};
use service::config::Config;
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Clone)]
pub struct Grant(SecretString);

impl Grant {
    pub fn new(grant_id: impl Into<String>) -> Result<Self, Error> {
        let grant_id = grant_id.into();
        if grant_id.trim().is_empty() {
            return Err(Error::unauthenticated("Not authenticated"));
        }
        Ok(Self(SecretString::new(grant_id)))
    }

    /// The raw grant id, for upstream calls and the caller's own session only.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Short, stable identifier safe to write to logs.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.expose().as_bytes());
        hex::encode(&digest[..3])
    }
}

impl fmt::Debug for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grant({})", self.fingerprint())
    }
}

impl PartialEq for Grant {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

/// Start hosted authentication: build the consent URL and make sure upstream answers it.
pub async fn begin_authorization(
    accounts: &dyn account::Provider,
    config: &Config,
    states: &StateManager,
) -> Result<String, Error> {
    let client_id = config.nylas_client_id().ok_or_else(|| {
        error!("NYLAS_CLIENT_ID is not configured");
        Error::config("Missing Nylas client id")
    })?;

    let auth_endpoint = format!("{}/connect/auth", config.nylas_base_url());
    let request =
        AuthorizationRequest::build(&auth_endpoint, &client_id, &config.redirect_uri(), states)?;

    debug!("Probing hosted authentication page before redirecting the caller");
    accounts.probe_authorization(&request.url).await?;

    Ok(request.url)
}

/// Finish hosted authentication by trading `code` for a grant.
///
/// A `state` returned by the provider must be one this process issued. Callbacks
/// that carry no state fall back to the configured PKCE verifier.
pub async fn complete_authorization(
    accounts: &dyn account::Provider,
    config: &Config,
    states: &StateManager,
    code: Option<&str>,
    state: Option<&str>,
) -> Result<Grant, Error> {
    let code = code
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .ok_or_else(|| Error::invalid("No authorization code provided"))?;

    let verifier = match state {
        Some(state) => states
            .validate(state)
            .ok_or_else(|| {
                warn!("Rejecting auth callback with unknown or expired state");
                Error::invalid("Invalid or expired state")
            })?
            .pkce_verifier
            .unwrap_or_else(|| config.pkce_fallback_verifier().to_string()),
        None => config.pkce_fallback_verifier().to_string(),
    };

    let client_id = config
        .nylas_client_id()
        .ok_or_else(|| Error::config("Missing Nylas client id"))?;
    let client_secret = config
        .nylas_api_key()
        .ok_or_else(|| Error::config("Missing Nylas API key"))?;

    let exchange = CodeExchange::new(
        &client_id,
        &client_secret,
        &config.redirect_uri(),
        code,
        &verifier,
    );

    let info = accounts.exchange_code(exchange).await.map_err(|e| {
        warn!("Token exchange failed: {e}");
        exchange_failed(e)
    })?;

    let grant = Grant::new(info.grant_id).map_err(|_| Error {
        source: None,
        error_kind: DomainErrorKind::External(ExternalErrorKind::MalformedResponse(
            "No grant_id in token response".to_string(),
        )),
    })?;
    info!("Authorized grant {}", grant.fingerprint());
    Ok(grant)
}

/// Liveness probe. Never an error: anything but a clean 2xx is `false`.
pub async fn is_valid(accounts: &dyn account::Provider, grant: &Grant) -> bool {
    let valid = accounts.grant_is_valid(grant.expose()).await;
    if !valid {
        debug!("Grant {} failed its liveness probe", grant.fingerprint());
    }
    valid
}

fn exchange_failed(err: meeting_ai::Error) -> Error {
    let error_kind = match &err {
        meeting_ai::Error::MalformedResponse(message) => {
            ExternalErrorKind::MalformedResponse(message.clone())
        }
        meeting_ai::Error::Network(_) => ExternalErrorKind::Network,
        meeting_ai::Error::Authentication(body) => ExternalErrorKind::ExchangeFailed {
            status: Some(401),
            body: body.clone(),
        },
        meeting_ai::Error::Upstream { status, body }
        | meeting_ai::Error::Unavailable { status, body } => ExternalErrorKind::ExchangeFailed {
            status: Some(*status),
            body: body.clone(),
        },
        other => ExternalErrorKind::ExchangeFailed {
            status: other.status(),
            body: other.to_string(),
        },
    };
    Error {
        source: Some(Box::new(err)),
        error_kind: DomainErrorKind::External(error_kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InternalErrorKind, RequestErrorKind};
    use crate::test_support::MockAccounts;
    use meeting_ai::types::account::GrantInfo;
    use serial_test::serial;

    fn test_config() -> Config {
        Config::default()
            .set_nylas_client_id("client-123".to_string())
            .set_nylas_api_key("nyk_test".to_string())
    }

    #[test]
    fn debug_never_shows_the_grant_id() {
        let grant = Grant::new("grant-secret-id").unwrap();
        let debug = format!("{grant:?}");

        assert!(!debug.contains("grant-secret-id"));
        assert_eq!(debug, format!("Grant({})", grant.fingerprint()));
        assert_eq!(grant.fingerprint().len(), 6);
    }

    #[test]
    fn blank_grant_is_unauthenticated() {
        let err = Grant::new("  ").unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Request(
                RequestErrorKind::Unauthenticated
            ))
        );
    }

    #[tokio::test]
    #[serial]
    async fn missing_code_is_invalid_and_never_calls_upstream() {
        let mut accounts = MockAccounts::new();
        accounts.expect_exchange_code().never();

        let err = complete_authorization(&accounts, &test_config(), &StateManager::new(), None, None)
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Request(RequestErrorKind::Invalid(
                "No authorization code provided".to_string()
            )))
        );
    }

    #[tokio::test]
    #[serial]
    async fn callback_without_state_uses_fallback_verifier() {
        let mut accounts = MockAccounts::new();
        accounts
            .expect_exchange_code()
            .withf(|exchange| {
                exchange.code == "code-1"
                    && exchange.code_verifier == "nylas"
                    && exchange.client_secret == "nyk_test"
                    && exchange.redirect_uri.ends_with("/auth-success.html")
            })
            .times(1)
            .returning(|_| {
                Ok(GrantInfo {
                    grant_id: "g1".to_string(),
                    email: None,
                })
            });

        let grant = complete_authorization(
            &accounts,
            &test_config(),
            &StateManager::new(),
            Some("code-1"),
            None,
        )
        .await
        .unwrap();

        assert_eq!(grant.expose(), "g1");
    }

    #[tokio::test]
    #[serial]
    async fn callback_state_supplies_its_pkce_verifier() {
        let states = StateManager::new();
        let state = states.generate(Some("verifier-abc".to_string()));

        let mut accounts = MockAccounts::new();
        accounts
            .expect_exchange_code()
            .withf(|exchange| exchange.code_verifier == "verifier-abc")
            .times(1)
            .returning(|_| {
                Ok(GrantInfo {
                    grant_id: "g1".to_string(),
                    email: None,
                })
            });

        complete_authorization(&accounts, &test_config(), &states, Some("c"), Some(&state))
            .await
            .unwrap();
        assert!(states.is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn unknown_state_is_rejected() {
        let mut accounts = MockAccounts::new();
        accounts.expect_exchange_code().never();

        let err = complete_authorization(
            &accounts,
            &test_config(),
            &StateManager::new(),
            Some("c"),
            Some("forged"),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Request(RequestErrorKind::Invalid(_)))
        ));
    }

    #[tokio::test]
    #[serial]
    async fn upstream_rejection_is_an_exchange_failure() {
        let mut accounts = MockAccounts::new();
        accounts.expect_exchange_code().returning(|_| {
            Err(meeting_ai::Error::Upstream {
                status: 400,
                body: "invalid_grant".to_string(),
            })
        });

        let err = complete_authorization(
            &accounts,
            &test_config(),
            &StateManager::new(),
            Some("c"),
            None,
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::ExchangeFailed {
                status: Some(400),
                body: "invalid_grant".to_string()
            })
        );
    }

    #[tokio::test]
    #[serial]
    async fn begin_authorization_returns_probed_url() {
        let mut accounts = MockAccounts::new();
        accounts
            .expect_probe_authorization()
            .withf(|url| url.contains("/connect/auth?client_id=client-123"))
            .times(1)
            .returning(|_| Ok(()));

        let states = StateManager::new();
        let url = begin_authorization(&accounts, &test_config(), &states)
            .await
            .unwrap();

        assert!(url.contains("response_type=code"));
        assert_eq!(states.len(), 1);
    }

    #[tokio::test]
    #[serial]
    async fn begin_authorization_surfaces_unavailable() {
        let mut accounts = MockAccounts::new();
        accounts.expect_probe_authorization().returning(|_| {
            Err(meeting_ai::Error::Unavailable {
                status: 502,
                body: String::new(),
            })
        });

        let err = begin_authorization(&accounts, &test_config(), &StateManager::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Unavailable { status: 502, .. })
        ));
    }

    #[tokio::test]
    async fn failed_probe_is_invalid_not_an_error() {
        let mut accounts = MockAccounts::new();
        accounts
            .expect_grant_is_valid()
            .withf(|grant_id| grant_id == "g1")
            .returning(|_| false);

        assert!(!is_valid(&accounts, &Grant::new("g1").unwrap()).await);
    }
}
