use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing CAS ticket")]
    MissingTicket,

    #[error("CAS authentication failed ({code}): {message}")]
    CasFailure { code: String, message: String },

    #[error("malformed CAS response: {0}")]
    MalformedResponse(String),

    #[error("session not found")]
    SessionNotFound,

    #[error("session expired")]
    SessionExpired,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("CAS server error: {0}")]
    Provider(String),
}
