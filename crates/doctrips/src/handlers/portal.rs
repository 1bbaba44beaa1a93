//! Self-service forms for volunteers and incoming students.
//!
//! Each signed-in user has at most one application and one registration per
//! trips year. Submitting a second time redirects to the existing one.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use doctrips_core::applications::{
    ApplicationInfo, ApplicationStatus, GeneralApplication, PortalContent,
};
use doctrips_core::incoming::{IncomingError, Registration};
use doctrips_core::permissions::User;
use doctrips_core::record::{RecordKind, ValidationError};
use doctrips_core::storage::RepositoryError;

use super::authz::AuthzError;
use super::crud::{save, RecordView, Write};
use super::flash::{redirect_with_flash, FlashMessage};
use super::AppError;
use crate::context::RequestContext;
use crate::state::AppState;

fn object(payload: &mut Value) -> Result<&mut Map<String, Value>, AppError> {
    payload
        .as_object_mut()
        .ok_or_else(|| ValidationError("expected a JSON object".to_string()).into())
}

/// Ties the form to the signed-in user, filling in name and email when blank.
fn stamp_owner(payload: &mut Value, owner_field: &str, user: &User) -> Result<(), AppError> {
    let fields = object(payload)?;
    fields.insert(owner_field.to_string(), json!(user.id));
    fields.insert("netid".to_string(), json!(user.netid));
    for (field, default) in [("name", &user.name), ("email", &user.email)] {
        let blank = fields
            .get(field)
            .and_then(Value::as_str)
            .is_none_or(|s| s.trim().is_empty());
        if blank {
            fields.insert(field.to_string(), json!(default));
        }
    }
    Ok(())
}

fn set_nested(fields: &mut Map<String, Value>, outer: &str, inner: &str, value: Value) {
    let entry = fields
        .entry(outer.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    if let Some(map) = entry.as_object_mut() {
        map.insert(inner.to_string(), value);
    }
}

/// Status and assignments belong to the directorate, not the applicant.
fn keep_decisions(
    payload: &mut Value,
    status: ApplicationStatus,
    assigned_trip: Option<Uuid>,
    assigned_croo: Option<Uuid>,
) -> Result<(), AppError> {
    let fields = object(payload)?;
    fields.insert("status".to_string(), json!(status));
    set_nested(fields, "leader_supplement", "assigned_trip", json!(assigned_trip));
    set_nested(fields, "croo_supplement", "assigned_croo", json!(assigned_croo));
    Ok(())
}

pub(super) async fn own_registration(
    state: &AppState,
    user: &User,
    year: i32,
) -> Result<Option<Registration>, AppError> {
    let registrations = state.table::<Registration>().list(year).await?;
    Ok(registrations.into_iter().find(|r| r.user == user.id))
}

pub(super) async fn own_application(
    state: &AppState,
    user: &User,
    year: i32,
) -> Result<Option<GeneralApplication>, AppError> {
    let applications = state.table::<GeneralApplication>().list(year).await?;
    Ok(applications.into_iter().find(|a| a.applicant == user.id))
}

async fn registration_open(state: &AppState) -> Result<(), AppError> {
    if state.timetable.get_timetable().await?.registration_available(Utc::now()) {
        Ok(())
    } else {
        Err(IncomingError::RegistrationClosed.into())
    }
}

async fn applications_open(state: &AppState) -> Result<(), AppError> {
    if state.timetable.get_timetable().await?.applications_available(Utc::now()) {
        Ok(())
    } else {
        Err(AuthzError::ApplicationsClosed.into())
    }
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(mut payload): Json<Value>,
) -> Result<Response, AppError> {
    let user = ctx.user()?;
    registration_open(&state).await?;
    let year = state.require_current_year().await?.year;

    if own_registration(&state, user, year).await?.is_some() {
        return Ok(redirect_with_flash(
            "/register/continue",
            FlashMessage::info("You've already submitted a registration"),
        ));
    }

    stamp_owner(&mut payload, "user", user)?;
    let record = save(&state, RecordKind::Registration, year, Uuid::new_v4(), payload, Write::Create).await?;
    tracing::info!(trips_year = year, netid = %user.netid, "Registration submitted");
    Ok((StatusCode::CREATED, Json(RecordView::from(record))).into_response())
}

/// GET /register/continue
pub async fn show_registration(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Registration>, AppError> {
    let user = ctx.user()?;
    let year = state.require_current_year().await?.year;
    own_registration(&state, user, year)
        .await?
        .map(Json)
        .ok_or_else(|| RepositoryError::not_found("registration", &user.netid).into())
}

/// PUT /register/continue
pub async fn update_registration(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(mut payload): Json<Value>,
) -> Result<Json<RecordView>, AppError> {
    let user = ctx.user()?;
    registration_open(&state).await?;
    let year = state.require_current_year().await?.year;
    let existing = own_registration(&state, user, year)
        .await?
        .ok_or_else(|| RepositoryError::not_found("registration", &user.netid))?;

    stamp_owner(&mut payload, "user", user)?;
    let record = save(&state, RecordKind::Registration, year, existing.id, payload, Write::Update).await?;
    tracing::info!(trips_year = year, netid = %user.netid, "Registration updated");
    Ok(Json(record.into()))
}

/// POST /apply
pub async fn apply(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(mut payload): Json<Value>,
) -> Result<Response, AppError> {
    let user = ctx.user()?;
    applications_open(&state).await?;
    let year = state.require_current_year().await?.year;

    if own_application(&state, user, year).await?.is_some() {
        return Ok(redirect_with_flash(
            "/apply/continue",
            FlashMessage::info("You've already submitted an application"),
        ));
    }

    stamp_owner(&mut payload, "applicant", user)?;
    keep_decisions(&mut payload, ApplicationStatus::Pending, None, None)?;
    let record = save(&state, RecordKind::Application, year, Uuid::new_v4(), payload, Write::Create).await?;
    tracing::info!(trips_year = year, netid = %user.netid, "Application submitted");
    Ok((StatusCode::CREATED, Json(RecordView::from(record))).into_response())
}

/// GET /apply/continue
pub async fn show_application(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<GeneralApplication>, AppError> {
    let user = ctx.user()?;
    let year = state.require_current_year().await?.year;
    own_application(&state, user, year)
        .await?
        .map(Json)
        .ok_or_else(|| RepositoryError::not_found("application", &user.netid).into())
}

/// PUT /apply/continue
pub async fn update_application(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(mut payload): Json<Value>,
) -> Result<Json<RecordView>, AppError> {
    let user = ctx.user()?;
    applications_open(&state).await?;
    let year = state.require_current_year().await?.year;
    let existing = own_application(&state, user, year)
        .await?
        .ok_or_else(|| RepositoryError::not_found("application", &user.netid))?;

    stamp_owner(&mut payload, "applicant", user)?;
    keep_decisions(
        &mut payload,
        existing.status,
        existing.leader_supplement.assigned_trip,
        existing.croo_supplement.assigned_croo,
    )?;
    let record = save(&state, RecordKind::Application, year, existing.id, payload, Write::Update).await?;
    tracing::info!(trips_year = year, netid = %user.netid, "Application updated");
    Ok(Json(record.into()))
}

#[derive(Debug, Serialize)]
pub struct ApplicationStatusView {
    pub status: ApplicationStatus,
    pub description: String,
    pub application_header: String,
}

/// GET /apply/status - where the signed-in volunteer stands, in the
/// directorate's words.
pub async fn application_status(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<ApplicationStatusView>, AppError> {
    let user = ctx.user()?;
    let year = state.require_current_year().await?.year;
    let application = own_application(&state, user, year)
        .await?
        .ok_or_else(|| RepositoryError::not_found("application", &user.netid))?;

    let content = state.table::<PortalContent>().list(year).await?.into_iter().next();
    let info = state.table::<ApplicationInfo>().list(year).await?.into_iter().next();
    Ok(Json(ApplicationStatusView {
        status: application.status,
        description: content
            .map(|c| c.status_description(application.status).to_string())
            .unwrap_or_default(),
        application_header: info.map(|i| i.application_header).unwrap_or_default(),
    }))
}
