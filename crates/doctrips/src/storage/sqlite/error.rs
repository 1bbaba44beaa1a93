//! Maps `rusqlite` and `tokio_rusqlite` errors to `RepositoryError`.

use doctrips_core::storage::RepositoryError;

/// Maps a rusqlite error to a RepositoryError.
///
/// - `SQLITE_CONSTRAINT_UNIQUE` and `SQLITE_CONSTRAINT_PRIMARYKEY` → `AlreadyExists`
/// - `SQLITE_CONSTRAINT_FOREIGNKEY` → `InvalidData`
/// - `SQLITE_CANTOPEN` → `ConnectionFailed`
/// - everything else → `QueryFailed`
pub fn map_rusqlite_error(
    err: &rusqlite::Error,
    entity_type: &'static str,
    id: &str,
) -> RepositoryError {
    match err {
        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            RepositoryError::already_exists(entity_type, id)
        }

        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            RepositoryError::InvalidData(format!(
                "Foreign key constraint violation for {entity_type}"
            ))
        }

        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.code == rusqlite::ErrorCode::CannotOpen =>
        {
            RepositoryError::ConnectionFailed(format!("Cannot open database: {err}"))
        }

        rusqlite::Error::QueryReturnedNoRows => RepositoryError::not_found(entity_type, id),

        rusqlite::Error::FromSqlConversionFailure(..) => {
            RepositoryError::Serialization(err.to_string())
        }

        _ => RepositoryError::QueryFailed(err.to_string()),
    }
}

/// Carries a domain error out of a `Connection::call` closure.
pub fn abort(err: RepositoryError) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Other(Box::new(err))
}

/// Maps a tokio_rusqlite error to a RepositoryError.
///
/// Errors raised with [`abort`] come back out unchanged.
pub fn map_tokio_rusqlite_error(
    err: tokio_rusqlite::Error,
    entity_type: &'static str,
    id: impl Into<String>,
) -> RepositoryError {
    let id: String = id.into();
    match err {
        tokio_rusqlite::Error::Rusqlite(rusqlite_err) => {
            map_rusqlite_error(&rusqlite_err, entity_type, &id)
        }
        tokio_rusqlite::Error::Close(_) => {
            RepositoryError::ConnectionFailed("Connection closed unexpectedly".to_string())
        }
        tokio_rusqlite::Error::Other(other) => match other.downcast::<RepositoryError>() {
            Ok(domain) => *domain,
            Err(other) => RepositoryError::QueryFailed(other.to_string()),
        },
        other => RepositoryError::QueryFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    fn failure(code: rusqlite::ErrorCode, extended_code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error { code, extended_code }, None)
    }

    #[test]
    fn test_unique_constraint_maps_to_already_exists() {
        let err = failure(
            rusqlite::ErrorCode::ConstraintViolation,
            ffi::SQLITE_CONSTRAINT_UNIQUE,
        );
        assert_eq!(
            map_rusqlite_error(&err, "section", "A"),
            RepositoryError::already_exists("section", "A")
        );
    }

    #[test]
    fn test_primary_key_constraint_maps_to_already_exists() {
        let err = failure(
            rusqlite::ErrorCode::ConstraintViolation,
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY,
        );
        assert!(matches!(
            map_rusqlite_error(&err, "trips_year", "2024"),
            RepositoryError::AlreadyExists { entity_type: "trips_year", .. }
        ));
    }

    #[test]
    fn test_cannot_open_maps_to_connection_failed() {
        let err = failure(rusqlite::ErrorCode::CannotOpen, ffi::SQLITE_CANTOPEN);
        assert!(matches!(
            map_rusqlite_error(&err, "record", ""),
            RepositoryError::ConnectionFailed(_)
        ));
    }

    #[test]
    fn test_no_rows_maps_to_not_found() {
        let err = rusqlite::Error::QueryReturnedNoRows;
        assert_eq!(
            map_rusqlite_error(&err, "user", "abc"),
            RepositoryError::not_found("user", "abc")
        );
    }

    #[test]
    fn test_aborted_domain_error_survives_the_round_trip() {
        let err = abort(RepositoryError::not_found("route", "xyz"));
        assert_eq!(
            map_tokio_rusqlite_error(err, "record", ""),
            RepositoryError::not_found("route", "xyz")
        );
    }
}
