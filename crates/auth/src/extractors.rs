//! Axum extractors for authentication.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use doctrips_core::auth::{is_session_expired, SessionId};
use doctrips_core::permissions::User;

use crate::AuthState;

type Rejection = (StatusCode, &'static str);

/// Session id from `Authorization: Bearer`, falling back to the session cookie.
pub(crate) fn session_id_from_parts(
    parts: &Parts,
    cookie_name: &str,
) -> Result<Option<SessionId>, Rejection> {
    if let Some(auth_header) = parts.headers.get(AUTHORIZATION) {
        let header_value = auth_header
            .to_str()
            .map_err(|_| (StatusCode::UNAUTHORIZED, "Invalid authorization header"))?;
        if let Some(token) = header_value.strip_prefix("Bearer ") {
            return Ok(Some(SessionId::new(token.trim().to_string())));
        }
    }

    let jar = CookieJar::from_headers(&parts.headers);
    Ok(jar
        .get(cookie_name)
        .map(|cookie| SessionId::new(cookie.value().to_string())))
}

async fn authenticate(auth_state: &AuthState, session_id: &SessionId) -> Result<User, Rejection> {
    let session = auth_state
        .sessions
        .get_session(session_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Session lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Session lookup failed")
        })?
        .ok_or((StatusCode::UNAUTHORIZED, "Session not found"))?;

    if is_session_expired(&session, Utc::now()) {
        return Err((StatusCode::UNAUTHORIZED, "Session expired"));
    }

    auth_state
        .users
        .get_user(session.user_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "User lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "User lookup failed")
        })?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found"))
}

/// Extractor for authenticated user. Returns 401 if not authenticated.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let session_id = session_id_from_parts(parts, &auth_state.config.cookie_name)?
            .ok_or((StatusCode::UNAUTHORIZED, "No session cookie"))?;

        authenticate(&auth_state, &session_id).await.map(CurrentUser)
    }
}

/// Extractor for optionally authenticated user. Returns None if not authenticated.
pub struct OptionalUser(pub Option<User>);

impl<S> FromRequestParts<S> for OptionalUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let session_id = match session_id_from_parts(parts, &auth_state.config.cookie_name) {
            Ok(Some(id)) => id,
            _ => return Ok(OptionalUser(None)),
        };

        Ok(OptionalUser(authenticate(&auth_state, &session_id).await.ok()))
    }
}
