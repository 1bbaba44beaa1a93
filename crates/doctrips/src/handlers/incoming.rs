//! Incoming students, their registrations and what they owe.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use doctrips_core::incoming::{
    compute_charges, parse_hinman_boxes, parse_registrar_csv, trip_choices, unmatched,
    unregistered, want_bus, want_financial_aid, Charges, HinmanSummary, ImportSummary,
    IncomingSettings, IncomingStudent, Registration, TripChoices,
};
use doctrips_core::permissions::Permission;
use doctrips_core::record::RecordKind;
use doctrips_core::reports::ReportError;
use doctrips_core::transport::Stop;
use doctrips_core::trips::{Trip, TripTemplate};

use super::crud::uniqueness_error;
use super::AppError;
use crate::context::RequestContext;
use crate::state::AppState;

/// POST /db/{year}/incoming/import - create students from a registrar CSV export.
pub async fn import(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(year): Path<i32>,
    body: Bytes,
) -> Result<(StatusCode, Json<ImportSummary>), AppError> {
    let user = ctx.require(Permission::EditDb)?;
    state.require_year(year).await?;

    let existing = state.table::<IncomingStudent>().list(year).await?;
    let registrations = state.table::<Registration>().list(year).await?;
    let import = parse_registrar_csv(&body, year, &existing, &registrations)?;

    state
        .table::<IncomingStudent>()
        .insert_all(&import.created)
        .await
        .map_err(|e| uniqueness_error(RecordKind::IncomingStudent, e))?;

    let summary = import.summary();
    tracing::info!(
        trips_year = year,
        created = summary.created.len(),
        ignored = summary.ignored.len(),
        netid = %user.netid,
        "Imported incoming students"
    );
    Ok((StatusCode::CREATED, Json(summary)))
}

/// POST /db/{year}/incoming/hinman-boxes - set hinman boxes from a `netid`,
/// `hinman box` CSV sheet.
pub async fn import_hinman_boxes(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(year): Path<i32>,
    body: Bytes,
) -> Result<Json<HinmanSummary>, AppError> {
    let user = ctx.require(Permission::EditDb)?;
    state.require_year(year).await?;

    let students = state.table::<IncomingStudent>();
    let import = parse_hinman_boxes(&body, year, &students.list(year).await?)?;
    students.update_all(&import.updated).await?;

    let summary = import.summary();
    tracing::info!(
        trips_year = year,
        updated = summary.updated.len(),
        not_found = summary.not_found.len(),
        netid = %user.netid,
        "Imported hinman boxes"
    );
    Ok(Json(summary))
}

/// GET /db/{year}/incoming/unregistered
pub async fn unregistered_students(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(year): Path<i32>,
) -> Result<Json<Vec<IncomingStudent>>, AppError> {
    ctx.require(Permission::ViewDb)?;
    state.require_year(year).await?;
    let students = state.table::<IncomingStudent>().list(year).await?;
    Ok(Json(unregistered(&students, year).into_iter().cloned().collect()))
}

/// GET /db/{year}/incoming/{id}/charges
pub async fn charges(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((year, id)): Path<(i32, Uuid)>,
) -> Result<Json<Charges>, AppError> {
    ctx.require(Permission::ViewDb)?;
    state.require_year(year).await?;

    let student = state.table::<IncomingStudent>().require(year, id).await?;
    let settings = state
        .table::<IncomingSettings>()
        .list(year)
        .await?
        .into_iter()
        .next()
        .ok_or(ReportError::MissingSettings(year))?;
    let registration = match student.registration {
        Some(registration) => state.table::<Registration>().get(year, registration).await?,
        None => None,
    };
    let stops: HashMap<Uuid, Stop> = state
        .table::<Stop>()
        .list(year)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    Ok(Json(compute_charges(
        &student,
        registration.as_ref(),
        &settings,
        &stops,
    )))
}

async fn registrations(state: &AppState, ctx: &RequestContext, year: i32) -> Result<Vec<Registration>, AppError> {
    ctx.require(Permission::ViewDb)?;
    state.require_year(year).await?;
    Ok(state.table::<Registration>().list(year).await?)
}

/// GET /db/{year}/registrations/financial-aid
pub async fn financial_aid(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(year): Path<i32>,
) -> Result<Json<Vec<Registration>>, AppError> {
    let all = registrations(&state, &ctx, year).await?;
    Ok(Json(want_financial_aid(&all, year).into_iter().cloned().collect()))
}

/// GET /db/{year}/registrations/bus-requests
pub async fn bus_requests(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(year): Path<i32>,
) -> Result<Json<Vec<Registration>>, AppError> {
    let all = registrations(&state, &ctx, year).await?;
    Ok(Json(want_bus(&all, year).into_iter().cloned().collect()))
}

/// GET /db/{year}/registrations/unmatched - registrations with no registrar record.
pub async fn unmatched_registrations(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(year): Path<i32>,
) -> Result<Json<Vec<Registration>>, AppError> {
    let all = registrations(&state, &ctx, year).await?;
    let students = state.table::<IncomingStudent>().list(year).await?;
    Ok(Json(
        unmatched(&all, &students, year).into_iter().cloned().collect(),
    ))
}

#[derive(Debug, Serialize)]
pub struct TripChoicesView {
    pub registration: Uuid,
    #[serde(flatten)]
    pub choices: TripChoices,
}

/// GET /db/{year}/registrations/{id}/trip-choices
pub async fn registration_trip_choices(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((year, id)): Path<(i32, Uuid)>,
) -> Result<Json<TripChoicesView>, AppError> {
    ctx.require(Permission::ViewDb)?;
    state.require_year(year).await?;
    let registration = state.table::<Registration>().require(year, id).await?;
    let trips = state.table::<Trip>().list(year).await?;
    let templates = state.table::<TripTemplate>().list(year).await?;

    Ok(Json(TripChoicesView {
        registration: registration.id,
        choices: trip_choices(&registration, &trips, &templates),
    }))
}
