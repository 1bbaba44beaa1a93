use thiserror::Error;

use crate::record::ValidationError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IncomingError {
    #[error("Cannot have round-trip AND one-way bus assignments")]
    RoundTripAndOneWayAssignment,
    #[error("You cannot select both a round-trip AND a one-way bus")]
    RoundTripAndOneWayRequest,
    #[error("Financial aid must be a percentage between 0 and 100, got {0}")]
    FinancialAidOutOfRange(u8),
    #[error("NetId cannot be empty")]
    EmptyNetid,
    #[error("You must agree to the waiver")]
    WaiverRequired,
    #[error("Registration is closed")]
    RegistrationClosed,
    #[error("Invalid import file: {0}")]
    Import(String),
}

impl From<IncomingError> for ValidationError {
    fn from(err: IncomingError) -> Self {
        ValidationError(err.to_string())
    }
}

impl From<csv::Error> for IncomingError {
    fn from(err: csv::Error) -> Self {
        IncomingError::Import(err.to_string())
    }
}
