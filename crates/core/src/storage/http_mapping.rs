//! HTTP status codes for [`RepositoryError`] variants.

use super::RepositoryError;

/// Maps a [`RepositoryError`] to an HTTP status code.
///
/// - `NotFound` -> 404
/// - `AlreadyExists` -> 409 (the uniqueness violation a form would report)
/// - `Protected` -> 409
/// - `ConnectionFailed` -> 503
/// - `QueryFailed`, `Serialization` -> 500
/// - `InvalidData` -> 400
///
/// # Examples
///
/// ```
/// use doctrips_core::storage::{RepositoryError, repository_error_to_status_code};
///
/// let error = RepositoryError::NotFound {
///     entity_type: "section",
///     id: "abc-123".to_string(),
/// };
/// assert_eq!(repository_error_to_status_code(&error), 404);
/// ```
pub fn repository_error_to_status_code(error: &RepositoryError) -> u16 {
    match error {
        RepositoryError::NotFound { .. } => 404,
        RepositoryError::AlreadyExists { .. } | RepositoryError::Protected { .. } => 409,
        RepositoryError::ConnectionFailed(_) => 503,
        RepositoryError::QueryFailed(_) | RepositoryError::Serialization(_) => 500,
        RepositoryError::InvalidData(_) => 400,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (RepositoryError::not_found("trip", "x"), 404),
            (RepositoryError::already_exists("trip", "x"), 409),
            (RepositoryError::protected("vehicle", "x", vec!["Green Route".into()]), 409),
            (RepositoryError::ConnectionFailed("down".into()), 503),
            (RepositoryError::QueryFailed("syntax".into()), 500),
            (RepositoryError::Serialization("eof".into()), 500),
            (RepositoryError::InvalidData("bad".into()), 400),
        ];
        for (error, code) in cases {
            assert_eq!(repository_error_to_status_code(&error), code, "{error}");
        }
    }
}
