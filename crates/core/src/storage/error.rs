use thiserror::Error;
use uuid::Uuid;

use crate::record::RecordKind;

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} {id} is still referenced by: {}", referenced_by.join(", "))]
    Protected {
        entity_type: &'static str,
        id: String,
        referenced_by: Vec<String>,
    },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl RepositoryError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn already_exists(entity_type: &'static str, id: impl ToString) -> Self {
        Self::AlreadyExists {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn protected(entity_type: &'static str, id: impl ToString, referenced_by: Vec<String>) -> Self {
        Self::Protected {
            entity_type,
            id: id.to_string(),
            referenced_by,
        }
    }

    /// A reference whose target is missing, of another kind or in another year.
    pub fn dangling(kind: RecordKind, target: Uuid, trips_year: i32) -> Self {
        Self::InvalidData(format!("{kind} {target} does not exist in trips year {trips_year}"))
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
