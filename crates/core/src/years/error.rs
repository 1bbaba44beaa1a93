use thiserror::Error;
use uuid::Uuid;

use crate::record::RecordKind;

/// Errors raised while copying a year forward.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ForwardError {
    #[error("only the current year can be forwarded, {0} is not current")]
    NotCurrent(i32),

    #[error("{kind} references {id}, which is not copied to the next year")]
    MissingReference { kind: RecordKind, id: Uuid },

    #[error("cannot forward many-to-many field {field} of {kind}")]
    ManyToManyUnsupported { kind: RecordKind, field: String },

    #[error("malformed {kind} document: {reason}")]
    MalformedDocument { kind: RecordKind, reason: String },
}
