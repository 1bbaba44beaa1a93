//! Pure types for request-scoped context.

use doctrips_core::permissions::{Permission, User};
use uuid::Uuid;

use crate::handlers::authz::AuthzError;

/// Unique identifier for a request, used for tracing and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request-scoped context available to all handlers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Authenticated user (None if anonymous).
    pub user: Option<User>,
    /// Unique request identifier for tracing.
    pub request_id: RequestId,
}

impl RequestContext {
    /// The signed-in user, or 401.
    pub fn user(&self) -> Result<&User, AuthzError> {
        self.user.as_ref().ok_or(AuthzError::Unauthenticated)
    }

    /// The signed-in user if they hold `permission`; 401 or 403 otherwise.
    pub fn require(&self, permission: Permission) -> Result<&User, AuthzError> {
        let user = self.user()?;
        if user.has_perm(permission) {
            Ok(user)
        } else {
            Err(AuthzError::Forbidden {
                netid: user.netid.clone(),
                permission,
                request_id: self.request_id,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doctrips_core::permissions::Group;

    fn ctx(user: Option<User>) -> RequestContext {
        RequestContext {
            user,
            request_id: RequestId::new(),
        }
    }

    #[test]
    fn test_require_checks_group_permissions() {
        let grader = User::new("d12345a", "Jane", "j@x.edu").with_groups(vec![Group::Graders]);
        let ctx = ctx(Some(grader));

        assert!(ctx.require(Permission::GradeLeaderApplications).is_ok());
        assert!(matches!(
            ctx.require(Permission::EditDb),
            Err(AuthzError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_anonymous_is_unauthenticated() {
        assert!(matches!(
            ctx(None).require(Permission::ViewDb),
            Err(AuthzError::Unauthenticated)
        ));
    }
}
