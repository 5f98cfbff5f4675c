//! CSRF state management for OAuth flows.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::Rng;
use std::sync::Arc;

/// State data stored during OAuth flow.
#[derive(Debug, Clone)]
pub struct StateData {
    /// PKCE verifier if PKCE was used.
    pub pkce_verifier: Option<String>,
    /// When this state expires.
    pub expires_at: DateTime<Utc>,
}

/// Manager for OAuth state parameters with expiration.
///
/// Each state is single use: `validate` removes it whether or not it has expired.
#[derive(Clone)]
pub struct StateManager {
    states: Arc<DashMap<String, StateData>>,
    ttl: Duration,
}

impl StateManager {
    /// Create a new state manager with default TTL of 10 minutes.
    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(10))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            states: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Generate a new state token, remembering the PKCE verifier bound to it.
    pub fn generate(&self, pkce_verifier: Option<String>) -> String {
        self.cleanup_expired();

        let state = Self::generate_token();
        let data = StateData {
            pkce_verifier,
            expires_at: Utc::now() + self.ttl,
        };
        self.states.insert(state.clone(), data);

        state
    }

    /// Validate and consume a state token.
    ///
    /// Returns `None` for unknown, already consumed, or expired states.
    pub fn validate(&self, state: &str) -> Option<StateData> {
        let (_, data) = self.states.remove(state)?;
        if Utc::now() > data.expires_at {
            return None;
        }
        Some(data)
    }

    /// Drop expired states.
    pub fn cleanup_expired(&self) {
        let now = Utc::now();
        self.states.retain(|_, data| data.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn generate_token() -> String {
        let random_bytes: [u8; 32] = rand::thread_rng().gen();
        hex::encode(random_bytes)
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}
