use thiserror::Error;

use crate::record::ValidationError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("Grade must be between 1 and 6, got {0}")]
    GradeOutOfRange(u8),
    #[error("Croo name cannot be empty")]
    EmptyCrooName,
    #[error("You have already graded this application")]
    AlreadyGraded,
    #[error("Application is not complete")]
    Incomplete,
}

impl From<ApplicationError> for ValidationError {
    fn from(err: ApplicationError) -> Self {
        ValidationError(err.to_string())
    }
}
