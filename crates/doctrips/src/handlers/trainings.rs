//! Training attendance and volunteer signups.

use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use doctrips_core::permissions::Permission;
use doctrips_core::storage::RepositoryError;
use doctrips_core::training::{
    record_attendance, session_roster, Attendee, SessionRoster, TrainingSession,
};

use super::portal::own_application;
use super::AppError;
use crate::context::RequestContext;
use crate::state::AppState;

/// GET /db/{year}/sessions/{id}/attendance
pub async fn attendance(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((year, id)): Path<(i32, Uuid)>,
) -> Result<Json<SessionRoster>, AppError> {
    ctx.require(Permission::ViewDb)?;
    state.require_year(year).await?;
    state.table::<TrainingSession>().require(year, id).await?;
    let attendees = state.table::<Attendee>().list(year).await?;
    Ok(Json(session_roster(id, &attendees)))
}

#[derive(Debug, Deserialize)]
pub struct AttendanceForm {
    /// Attendee ids.
    #[serde(default)]
    pub completed: Vec<Uuid>,
}

/// PUT /db/{year}/sessions/{id}/attendance
pub async fn update_attendance(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((year, id)): Path<(i32, Uuid)>,
    Json(form): Json<AttendanceForm>,
) -> Result<Json<SessionRoster>, AppError> {
    let user = ctx.require(Permission::EditTrainings)?;
    state.require_year(year).await?;
    state.table::<TrainingSession>().require(year, id).await?;

    let table = state.table::<Attendee>();
    let attendees = table.list(year).await?;
    let completed: HashSet<Uuid> = form.completed.into_iter().collect();
    let changed = record_attendance(id, &attendees, &completed)?;
    table.update_all(&changed).await?;

    tracing::info!(
        trips_year = year,
        session = %id,
        completed = completed.len(),
        changed = changed.len(),
        netid = %user.netid,
        "Recorded training attendance"
    );
    Ok(Json(session_roster(id, &table.list(year).await?)))
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub registered_sessions: Vec<Uuid>,
}

/// GET /apply/trainings
pub async fn show_signup(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Option<Attendee>>, AppError> {
    let user = ctx.user()?;
    let year = state.require_current_year().await?.year;
    let Some(application) = own_application(&state, user, year).await? else {
        return Err(RepositoryError::not_found("application", &user.netid).into());
    };
    let attendees = state.table::<Attendee>().list(year).await?;
    Ok(Json(attendees.into_iter().find(|a| a.volunteer == application.id)))
}

/// PUT /apply/trainings - a volunteer picks the sessions they will attend.
pub async fn update_signup(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(form): Json<SignupForm>,
) -> Result<Json<Attendee>, AppError> {
    let user = ctx.user()?;
    let year = state.require_current_year().await?.year;
    let application = own_application(&state, user, year)
        .await?
        .ok_or_else(|| RepositoryError::not_found("application", &user.netid))?;

    let sessions = state.table::<TrainingSession>();
    for session in &form.registered_sessions {
        sessions.require(year, *session).await?;
    }

    let table = state.table::<Attendee>();
    let existing = table
        .list(year)
        .await?
        .into_iter()
        .find(|a| a.volunteer == application.id);
    let attendee = match existing {
        Some(mut attendee) => {
            attendee.registered_sessions = form.registered_sessions;
            table.update(&attendee).await?;
            attendee
        }
        None => {
            let mut attendee = Attendee::new(year, application.id, application.name);
            attendee.registered_sessions = form.registered_sessions;
            table.insert(&attendee).await?;
            attendee
        }
    };

    tracing::info!(
        trips_year = year,
        sessions = attendee.registered_sessions.len(),
        netid = %user.netid,
        "Training signup saved"
    );
    Ok(Json(attendee))
}
