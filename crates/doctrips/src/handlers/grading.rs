//! Grading leader and croo applications of the current year.
//!
//! Graders are handed applications one at a time. The selection is random
//! among the applications with the fewest grades, so the pool is covered
//! evenly before anything gets graded twice.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use doctrips_core::applications::{
    ensure_not_graded, grade_progress, next_croo_to_grade_for, next_to_grade, Croo, CrooGrade,
    GeneralApplication, GradeKind, GradeProgress, LeaderGrade,
};
use doctrips_core::permissions::{Permission, User};
use doctrips_core::record::RecordKind;
use doctrips_core::storage::RepositoryError;

use super::authz::AuthzError;
use super::crud::{save, RecordView, Write};
use super::AppError;
use crate::context::RequestContext;
use crate::state::AppState;

fn parse_kind(segment: &str) -> Result<GradeKind, AppError> {
    GradeKind::from_path(segment)
        .ok_or_else(|| RepositoryError::not_found("grade_kind", segment).into())
}

fn permission_for(kind: GradeKind) -> Permission {
    match kind {
        GradeKind::Leader => Permission::GradeLeaderApplications,
        GradeKind::Croo => Permission::GradeCrooApplications,
    }
}

fn record_kind(kind: GradeKind) -> RecordKind {
    match kind {
        GradeKind::Leader => RecordKind::LeaderGrade,
        GradeKind::Croo => RecordKind::CrooGrade,
    }
}

/// Checks the grader's permission and the grading window, returning the
/// grader and the current trips year.
async fn grader<'a>(
    state: &AppState,
    ctx: &'a RequestContext,
    kind: GradeKind,
) -> Result<(&'a User, i32), AppError> {
    let user = ctx.require(permission_for(kind))?;
    if !state.timetable.get_timetable().await?.grading_available(Utc::now()) {
        return Err(AuthzError::GradingClosed.into());
    }
    let year = state.require_current_year().await?;
    Ok((user, year.year))
}

fn next_or_done(kind: GradeKind, next: Option<Uuid>) -> Response {
    match next {
        Some(id) => Redirect::to(&format!("/grade/{}/{id}", kind.as_path())).into_response(),
        None => Json(json!({ "done": true })).into_response(),
    }
}

/// GET /grade/{kind}/next
pub async fn next(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(segment): Path<String>,
) -> Result<Response, AppError> {
    let kind = parse_kind(&segment)?;
    let (user, year) = grader(&state, &ctx, kind).await?;
    let applications = state.table::<GeneralApplication>().list(year).await?;

    let next = match kind {
        GradeKind::Leader => {
            let grades = state.table::<LeaderGrade>().list(year).await?;
            let mut rng = rand::rng();
            next_to_grade(kind, &applications, year, &grades, user.id, &mut rng).map(|a| a.id)
        }
        GradeKind::Croo => {
            let grades = state.table::<CrooGrade>().list(year).await?;
            let mut rng = rand::rng();
            next_to_grade(kind, &applications, year, &grades, user.id, &mut rng).map(|a| a.id)
        }
    };

    tracing::debug!(grader = %user.netid, kind = kind.as_path(), next = ?next, "Picked next application");
    Ok(next_or_done(kind, next))
}

/// GET /grade/croos/next-for/{croo} - an application tagged for `croo` by another grader.
pub async fn next_for_croo(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((segment, croo)): Path<(String, Uuid)>,
) -> Result<Response, AppError> {
    let kind = parse_kind(&segment)?;
    if kind != GradeKind::Croo {
        return Err(RepositoryError::not_found("grade_kind", segment).into());
    }
    let (user, year) = grader(&state, &ctx, kind).await?;
    state.table::<Croo>().require(year, croo).await?;

    let applications = state.table::<GeneralApplication>().list(year).await?;
    let grades = state.table::<CrooGrade>().list(year).await?;
    let next = {
        let mut rng = rand::rng();
        next_croo_to_grade_for(croo, &applications, year, &grades, user.id, &mut rng).map(|a| a.id)
    };
    Ok(next_or_done(kind, next))
}

/// GET /grade/{kind}/progress
pub async fn progress(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(segment): Path<String>,
) -> Result<Json<GradeProgress>, AppError> {
    let kind = parse_kind(&segment)?;
    let (_, year) = grader(&state, &ctx, kind).await?;
    let applications = state.table::<GeneralApplication>().list(year).await?;

    let progress = match kind {
        GradeKind::Leader => {
            grade_progress(kind, &applications, &state.table::<LeaderGrade>().list(year).await?)
        }
        GradeKind::Croo => {
            grade_progress(kind, &applications, &state.table::<CrooGrade>().list(year).await?)
        }
    };
    Ok(Json(progress))
}

async fn gradeable(
    state: &AppState,
    kind: GradeKind,
    year: i32,
    id: Uuid,
) -> Result<GeneralApplication, AppError> {
    let application = state.table::<GeneralApplication>().require(year, id).await?;
    if !kind.is_complete(&application) {
        return Err(RepositoryError::not_found("application", id).into());
    }
    Ok(application)
}

/// GET /grade/{kind}/{id}
pub async fn show(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((segment, id)): Path<(String, Uuid)>,
) -> Result<Json<GeneralApplication>, AppError> {
    let kind = parse_kind(&segment)?;
    let (_, year) = grader(&state, &ctx, kind).await?;
    Ok(Json(gradeable(&state, kind, year, id).await?))
}

#[derive(Debug, Deserialize)]
pub struct GradeForm {
    pub grade: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub hard_skills: bool,
    #[serde(default)]
    pub soft_skills: bool,
    #[serde(default)]
    pub potential_croos: Vec<Uuid>,
}

/// POST /grade/{kind}/{id}
pub async fn submit(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((segment, id)): Path<(String, Uuid)>,
    Json(form): Json<GradeForm>,
) -> Result<(StatusCode, Json<RecordView>), AppError> {
    let kind = parse_kind(&segment)?;
    let (user, year) = grader(&state, &ctx, kind).await?;
    let application = gradeable(&state, kind, year, id).await?;

    let payload: Value = match kind {
        GradeKind::Leader => {
            let grades = state.table::<LeaderGrade>().list(year).await?;
            ensure_not_graded(&grades, application.id, user.id)?;
            json!({
                "application": application.id,
                "grader": user.id,
                "grade": form.grade,
                "comment": form.comment,
                "hard_skills": form.hard_skills,
                "soft_skills": form.soft_skills,
            })
        }
        GradeKind::Croo => {
            let grades = state.table::<CrooGrade>().list(year).await?;
            ensure_not_graded(&grades, application.id, user.id)?;
            json!({
                "application": application.id,
                "grader": user.id,
                "grade": form.grade,
                "comment": form.comment,
                "potential_croos": form.potential_croos,
            })
        }
    };

    let record = save(
        &state,
        record_kind(kind),
        year,
        Uuid::new_v4(),
        payload,
        Write::Create,
    )
    .await?;
    tracing::info!(
        trips_year = year,
        kind = kind.as_path(),
        application = %application.id,
        grader = %user.netid,
        "Recorded grade"
    );
    Ok((StatusCode::CREATED, Json(record.into())))
}
