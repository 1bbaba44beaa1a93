use thiserror::Error;

use crate::record::ValidationError;

/// Errors raised when validating sections, templates and trips.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TripError {
    #[error("Section name must be a single character, got {0:?}")]
    InvalidSectionName(String),
    #[error("Value must be in range 0-999")]
    TemplateNameOutOfRange(u16),
    #[error("Name cannot be empty")]
    EmptyName,
    #[error("Trip template must have room for at least one trippee")]
    NoTrippees,
}

impl From<TripError> for ValidationError {
    fn from(err: TripError) -> Self {
        ValidationError(err.to_string())
    }
}
