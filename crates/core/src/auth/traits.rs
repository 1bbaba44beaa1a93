use async_trait::async_trait;
use url::Url;
use uuid::Uuid;

use super::{AuthError, CasIdentity, Session, SessionId};

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// A CAS single sign-on server.
#[async_trait]
pub trait CasClient: Send + Sync {
    /// Login page the browser is sent to.
    fn login_url(&self, service: &str) -> Result<Url>;

    /// Validates a service ticket issued for `service`.
    async fn validate_ticket(&self, ticket: &str, service: &str) -> Result<CasIdentity>;
}

/// Session storage abstraction.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Store a new session.
    async fn create_session(&self, session: &Session) -> Result<()>;

    /// Retrieve session by ID.
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>>;

    /// Delete a specific session.
    async fn delete_session(&self, id: &SessionId) -> Result<()>;

    /// Delete all sessions for a user.
    async fn delete_user_sessions(&self, user_id: Uuid) -> Result<()>;
}
