//! User accounts and their permission groups.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use doctrips_core::permissions::{Group, Permission, User};
use doctrips_core::storage::RepositoryError;

use super::error::Conflict;
use super::AppError;
use crate::context::RequestContext;
use crate::state::AppState;

/// GET /users
pub async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Vec<User>>, AppError> {
    ctx.require(Permission::SetAccess)?;
    Ok(Json(state.users.list_users().await?))
}

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub netid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

/// POST /users - a missing email is looked up in the directory.
pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let admin = ctx.require(Permission::SetAccess)?;
    let netid = body.netid.trim().to_lowercase();
    if state.users.get_user_by_netid(&netid).await?.is_some() {
        return Err(Conflict(format!("User with this netid already exists: {netid}")).into());
    }

    let email = match body.email.filter(|e| !e.trim().is_empty()) {
        Some(email) => email,
        None => state.directory.lookup_email(&netid).await?,
    };
    let name = body
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| netid.clone());
    let user = User::new(netid, name, email).with_groups(body.groups);

    state.users.create_user(&user).await.map_err(|e| match e {
        RepositoryError::AlreadyExists { .. } => {
            AppError::from(Conflict(format!("User with this netid already exists: {}", user.netid)))
        }
        other => other.into(),
    })?;
    tracing::info!(netid = %user.netid, by = %admin.netid, "Created user");
    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Deserialize)]
pub struct SetGroups {
    pub groups: Vec<Group>,
}

/// PUT /users/{id}/groups
pub async fn set_groups(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(body): Json<SetGroups>,
) -> Result<Json<User>, AppError> {
    let admin = ctx.require(Permission::SetAccess)?;
    let mut user = state
        .users
        .get_user(id)
        .await?
        .ok_or_else(|| RepositoryError::not_found("user", id))?;

    user.set_groups(body.groups);
    state.users.update_user(&user).await?;
    tracing::info!(
        netid = %user.netid,
        groups = ?user.groups,
        by = %admin.netid,
        "Changed user groups"
    );
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub term: String,
}

/// GET /users/lookup?term= - DartDm search, for any signed-in user.
pub async fn lookup(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<LookupQuery>,
) -> Result<Json<Value>, AppError> {
    ctx.user()?;
    Ok(Json(state.directory.search(&query.term).await?))
}
