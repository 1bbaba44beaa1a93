//! Application state for auth.

use std::sync::Arc;

use axum::extract::FromRef;
use doctrips_core::auth::{CasClient, SessionRepository};
use doctrips_core::storage::UserRepository;

use crate::config::AuthConfig;

#[cfg(not(feature = "mock"))]
use crate::providers::CasServer;

#[cfg(feature = "mock")]
use crate::providers::MockCas;

/// Shared state for auth handlers.
#[derive(Clone)]
pub struct AuthState {
    pub sessions: Arc<dyn SessionRepository>,
    pub users: Arc<dyn UserRepository>,
    pub cas: Arc<dyn CasClient>,
    pub config: AuthConfig,
}

impl AuthState {
    /// Creates an AuthState that validates tickets against `config.cas_url`.
    #[cfg(not(feature = "mock"))]
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        users: Arc<dyn UserRepository>,
        config: AuthConfig,
    ) -> Self {
        let cas = Arc::new(CasServer::new(config.cas_url.clone()));
        Self::with_cas(sessions, users, cas, config)
    }

    /// Creates an AuthState backed by the mock CAS login page.
    #[cfg(feature = "mock")]
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        users: Arc<dyn UserRepository>,
        config: AuthConfig,
    ) -> Self {
        let cas = Arc::new(MockCas::new(config.base_url.clone()));
        Self::with_cas(sessions, users, cas, config)
    }

    /// Creates an AuthState with an explicit CAS client.
    pub fn with_cas(
        sessions: Arc<dyn SessionRepository>,
        users: Arc<dyn UserRepository>,
        cas: Arc<dyn CasClient>,
        config: AuthConfig,
    ) -> Self {
        Self {
            sessions,
            users,
            cas,
            config,
        }
    }
}

/// Allows AuthState to be extracted from a parent state.
impl<S> FromRef<S> for AuthState
where
    S: AsRef<AuthState>,
{
    fn from_ref(state: &S) -> Self {
        state.as_ref().clone()
    }
}
