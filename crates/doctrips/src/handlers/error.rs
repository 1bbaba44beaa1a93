use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use doctrips_core::applications::ApplicationError;
use doctrips_core::gear::GearError;
use doctrips_core::incoming::IncomingError;
use doctrips_core::record::ValidationError;
use doctrips_core::reports::ReportError;
use doctrips_core::storage::{repository_error_to_status_code, RepositoryError};
use doctrips_core::training::TrainingError;
use doctrips_core::transport::{MapError, TransportError};
use doctrips_core::trips::TripError;
use doctrips_core::years::ForwardError;

use super::authz::AuthzError;
use crate::services::LookupError;

/// A uniqueness clash reported with the fields that collide.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct Conflict(pub String);

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

fn status_of(err: &anyhow::Error) -> StatusCode {
    if let Some(repo_error) = err.downcast_ref::<RepositoryError>() {
        let code = repository_error_to_status_code(repo_error);
        return StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    }
    if err.is::<Conflict>() {
        return StatusCode::CONFLICT;
    }
    if err.is::<ValidationError>()
        || err.is::<TripError>()
        || err.is::<TransportError>()
        || err.is::<TrainingError>()
    {
        return StatusCode::BAD_REQUEST;
    }
    if let Some(GearError::NoRequester) = err.downcast_ref::<GearError>() {
        return StatusCode::FORBIDDEN;
    }
    if err.is::<GearError>() {
        return StatusCode::BAD_REQUEST;
    }
    if let Some(e) = err.downcast_ref::<IncomingError>() {
        return match e {
            IncomingError::RegistrationClosed => StatusCode::FORBIDDEN,
            _ => StatusCode::BAD_REQUEST,
        };
    }
    if let Some(e) = err.downcast_ref::<ApplicationError>() {
        return match e {
            ApplicationError::AlreadyGraded => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        };
    }
    if let Some(e) = err.downcast_ref::<ForwardError>() {
        return match e {
            ForwardError::NotCurrent(_) => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        };
    }
    if let Some(e) = err.downcast_ref::<ReportError>() {
        return match e {
            ReportError::UnknownReport(_) => StatusCode::NOT_FOUND,
            ReportError::MissingSettings(_) => StatusCode::BAD_REQUEST,
            ReportError::Csv(_) | ReportError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
    }
    if err.is::<LookupError>() || err.is::<MapError>() {
        return StatusCode::BAD_GATEWAY;
    }
    StatusCode::INTERNAL_SERVER_ERROR
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let err = match self.0.downcast::<AuthzError>() {
            Ok(authz) => return authz.into_response(),
            Err(err) => err,
        };

        let status_code = status_of(&err);
        if status_code.is_server_error() {
            tracing::error!(error = %err, "Request failed");
        } else if status_code == StatusCode::BAD_GATEWAY {
            tracing::warn!(error = %err, "Upstream service failed");
        }

        (status_code, err.to_string()).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doctrips_core::record::RecordKind;

    fn status(err: impl Into<anyhow::Error>) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status(RepositoryError::not_found("trip", "x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(ValidationError("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(ApplicationError::AlreadyGraded), StatusCode::CONFLICT);
        assert_eq!(
            status(ApplicationError::GradeOutOfRange(9)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(ForwardError::NotCurrent(2020)), StatusCode::CONFLICT);
        assert_eq!(
            status(ForwardError::ManyToManyUnsupported {
                kind: RecordKind::Stop,
                field: "/x".to_string()
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(ReportError::UnknownReport("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status(IncomingError::RegistrationClosed), StatusCode::FORBIDDEN);
        assert_eq!(status(GearError::NoRequester), StatusCode::FORBIDDEN);
        assert_eq!(
            status(TrainingError::NotRegistered("Sam".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(MapError::TooFewStops), StatusCode::BAD_GATEWAY);
        assert_eq!(status(AuthzError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(anyhow::anyhow!("boom")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
