use thiserror::Error;

use crate::record::ValidationError;

/// Errors raised when validating raids.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RaidError {
    #[error("raid must have a campsite or trip")]
    NoTarget,
    #[error("Comment cannot be empty")]
    EmptyComment,
}

impl From<RaidError> for ValidationError {
    fn from(err: RaidError) -> Self {
        ValidationError(err.to_string())
    }
}
