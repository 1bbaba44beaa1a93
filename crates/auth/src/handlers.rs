//! HTTP handlers for auth routes.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use doctrips_core::auth::{
    calculate_expiry, generate_session_id, validate_return_to, AuthError as CoreError,
    CasIdentity, Session, SessionId,
};
use doctrips_core::permissions::User;
use serde::Deserialize;

use crate::error::AuthError;
use crate::extractors::CurrentUser;
use crate::AuthState;

/// Query parameters for the login endpoint.
#[derive(Deserialize, Default)]
pub struct LoginQuery {
    /// Path to redirect to after successful authentication.
    pub next: Option<String>,
}

/// Query parameters for the CAS callback.
#[derive(Deserialize)]
pub struct CallbackQuery {
    pub ticket: Option<String>,
    pub next: Option<String>,
}

/// Creates the auth router with all authentication routes.
///
/// Routes:
/// - `GET /auth/login` - Redirect to the CAS login page
/// - `GET /auth/callback` - Validate the CAS ticket and start a session
/// - `POST /auth/logout` - End current session
/// - `POST /auth/logout-all` - End all sessions for current user
/// - `GET /auth/me` - Get current authenticated user
pub fn auth_routes() -> Router<AuthState> {
    let router = Router::new()
        .route("/auth/login", get(login))
        .route("/auth/callback", get(callback))
        .route("/auth/logout", post(logout))
        .route("/auth/logout-all", post(logout_all))
        .route("/auth/me", get(me));

    #[cfg(feature = "mock")]
    let router = router.merge(crate::mock_cas::routes());

    router
}

async fn login(
    State(state): State<AuthState>,
    Query(query): Query<LoginQuery>,
) -> Result<Redirect, AuthError> {
    let next = query.next.as_deref().and_then(validate_return_to);
    let service = state.config.service_url(next)?;
    let login_url = state.cas.login_url(service.as_str())?;

    Ok(Redirect::to(login_url.as_str()))
}

async fn callback(
    State(state): State<AuthState>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AuthError> {
    let ticket = query
        .ticket
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::Core(CoreError::MissingTicket))?;

    // CAS compares the service string byte for byte with the one sent at login.
    let service = state.config.service_url(query.next.as_deref())?;
    let identity = state
        .cas
        .validate_ticket(&ticket, service.as_str())
        .await?;

    let user = find_or_create_user(&state, &identity).await?;

    let now = Utc::now();
    let session = Session {
        id: generate_session_id(),
        user_id: user.id,
        netid: user.netid.clone(),
        created_at: now,
        expires_at: calculate_expiry(
            now,
            Duration::seconds(state.config.session_ttl.as_secs() as i64),
        ),
    };
    state.sessions.create_session(&session).await?;
    tracing::info!(netid = %user.netid, "Logged in");

    let cookie = Cookie::build((state.config.cookie_name.clone(), session.id.to_string()))
        .path("/")
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(
            state.config.session_ttl.as_secs() as i64
        ))
        .build();

    let jar = jar.add(cookie);

    let redirect_url = query
        .next
        .as_deref()
        .and_then(validate_return_to)
        .unwrap_or("/");
    Ok((jar, Redirect::to(redirect_url)))
}

async fn find_or_create_user(state: &AuthState, identity: &CasIdentity) -> Result<User, AuthError> {
    let storage = |e: doctrips_core::storage::RepositoryError| {
        AuthError::Core(CoreError::Storage(e.to_string()))
    };

    // Netids are stored lowercase.
    let netid = identity.netid.to_lowercase();
    if let Some(user) = state
        .users
        .get_user_by_netid(&netid)
        .await
        .map_err(storage)?
    {
        return Ok(user);
    }

    let name = identity.name.clone().unwrap_or_else(|| netid.clone());
    let user = User::new(netid, name, "");

    state.users.create_user(&user).await.map_err(storage)?;
    tracing::info!(netid = %user.netid, "Created user on first login");

    Ok(user)
}

async fn logout(
    State(state): State<AuthState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AuthError> {
    if let Some(cookie) = jar.get(&state.config.cookie_name) {
        let session_id = SessionId::new(cookie.value().to_string());
        state.sessions.delete_session(&session_id).await?;
    }

    let jar = jar.remove(Cookie::build(state.config.cookie_name.clone()).path("/"));
    Ok((jar, Redirect::to("/")))
}

async fn logout_all(
    State(state): State<AuthState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AuthError> {
    state.sessions.delete_user_sessions(user.id).await?;

    let jar = jar.remove(Cookie::build(state.config.cookie_name.clone()).path("/"));
    Ok((jar, Redirect::to("/")))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
