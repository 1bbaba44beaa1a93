use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Auth errors for the doctrips_auth crate.
///
/// This wraps the core `AuthError` and adds crate-specific error variants
/// for I/O operations that can't be in the functional core.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Error from the core auth module (CAS response parsing, sessions, etc.)
    #[error(transparent)]
    Core(#[from] doctrips_core::auth::AuthError),

    /// HTTP client error while talking to the CAS server
    #[error("HTTP error: {0}")]
    Http(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        AuthError::Http(e.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        use doctrips_core::auth::AuthError as CoreError;

        let (status, message) = match &self {
            AuthError::Core(core_err) => match core_err {
                CoreError::MissingTicket => (StatusCode::BAD_REQUEST, self.to_string()),
                CoreError::CasFailure { .. }
                | CoreError::SessionNotFound
                | CoreError::SessionExpired => {
                    tracing::warn!(error = %self, "Authentication rejected");
                    (StatusCode::UNAUTHORIZED, self.to_string())
                }
                CoreError::MalformedResponse(_) | CoreError::Provider(_) => {
                    tracing::error!("CAS error: {}", self);
                    (
                        StatusCode::BAD_GATEWAY,
                        "Authentication provider error".to_string(),
                    )
                }
                CoreError::Storage(_) => {
                    tracing::error!("Auth error: {}", self);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
            AuthError::Http(_) => {
                tracing::error!("HTTP error during auth: {}", self);
                (
                    StatusCode::BAD_GATEWAY,
                    "Authentication provider error".to_string(),
                )
            }
            AuthError::Config(_) => {
                tracing::error!("Config error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server configuration error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}
