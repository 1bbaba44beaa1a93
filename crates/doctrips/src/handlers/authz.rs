//! Authorization errors for API handlers.
//!
//! Anonymous requests get 401 Unauthorized and signed-in users without the
//! required permission get 403 Forbidden.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use doctrips_core::permissions::Permission;

use crate::context::RequestId;

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("Requires {permission} permission")]
    Forbidden {
        netid: String,
        permission: Permission,
        request_id: RequestId,
    },
    /// Grading is closed until the application deadline has passed.
    #[error("grading is not available")]
    GradingClosed,
    #[error("applications are not available")]
    ApplicationsClosed,
}

impl IntoResponse for AuthzError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
            }
            Self::Forbidden {
                ref netid,
                permission,
                request_id,
            } => {
                tracing::warn!(
                    netid = %netid,
                    required = %permission,
                    request_id = %request_id,
                    "Authorization denied: insufficient permission"
                );
                (StatusCode::FORBIDDEN, self.to_string()).into_response()
            }
            Self::GradingClosed | Self::ApplicationsClosed => {
                tracing::warn!(reason = %self, "Authorization denied: window is closed");
                (StatusCode::FORBIDDEN, self.to_string()).into_response()
            }
        }
    }
}
