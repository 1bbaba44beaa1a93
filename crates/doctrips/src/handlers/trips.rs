//! Trip scheduling views and trippee assignment.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use doctrips_core::applications::GeneralApplication;
use doctrips_core::incoming::{available_for_trip, IncomingStudent, Registration};
use doctrips_core::permissions::Permission;
use doctrips_core::transport::Stop;
use doctrips_core::trips::{
    campsite_occupancy, sections_for_template, trip_label, trip_matrix, Campsite, CampsiteNight,
    EffectiveRoutes, Section, Trip, TripDates, TripMatrix, TripTemplate,
};

use super::AppError;
use crate::context::RequestContext;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TripMatrixView {
    pub sections: Vec<Section>,
    pub templates: Vec<TripTemplate>,
    pub matrix: TripMatrix,
}

/// GET /db/{year}/trips/matrix
pub async fn matrix(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(year): Path<i32>,
) -> Result<Json<TripMatrixView>, AppError> {
    ctx.require(Permission::ViewDb)?;
    state.require_year(year).await?;

    let sections = state.table::<Section>().list(year).await?;
    let templates = state.table::<TripTemplate>().list(year).await?;
    let trips = state.table::<Trip>().list(year).await?;
    let matrix = trip_matrix(&templates, &sections, &trips);

    Ok(Json(TripMatrixView {
        sections,
        templates,
        matrix,
    }))
}

#[derive(Debug, Serialize)]
pub struct SectionSlot {
    pub section: Section,
    pub trip: Option<Trip>,
}

/// GET /db/{year}/templates/{id}/sections - each section with this template's trip, if scheduled.
pub async fn template_sections(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((year, id)): Path<(i32, Uuid)>,
) -> Result<Json<Vec<SectionSlot>>, AppError> {
    ctx.require(Permission::ViewDb)?;
    state.require_year(year).await?;
    let template = state.table::<TripTemplate>().require(year, id).await?;

    let sections = state.table::<Section>().list(year).await?;
    let trips = state.table::<Trip>().list(year).await?;
    let slots = sections_for_template(template.id, &sections, &trips)
        .into_iter()
        .map(|(section, trip)| SectionSlot {
            section: section.clone(),
            trip,
        })
        .collect();
    Ok(Json(slots))
}

/// GET /db/{year}/campsites/{id}/occupancy
pub async fn campsite_nights(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((year, id)): Path<(i32, Uuid)>,
) -> Result<Json<Vec<CampsiteNight>>, AppError> {
    ctx.require(Permission::ViewDb)?;
    state.require_year(year).await?;
    let campsite = state.table::<Campsite>().require(year, id).await?;

    let sections = state.table::<Section>().list(year).await?;
    let templates = state.table::<TripTemplate>().list(year).await?;
    let trips = state.table::<Trip>().list(year).await?;
    Ok(Json(campsite_occupancy(
        campsite.id,
        &sections,
        &templates,
        &trips,
    )))
}

#[derive(Debug, Serialize)]
pub struct TripDetail {
    pub label: String,
    pub trip: Trip,
    pub section: Section,
    pub template: TripTemplate,
    pub dates: TripDates,
    pub routes: EffectiveRoutes,
    pub leaders: Vec<GeneralApplication>,
    pub trippees: Vec<IncomingStudent>,
    /// Trippees plus leaders.
    pub size: usize,
}

/// GET /db/{year}/trips/{id}/detail
pub async fn detail(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((year, id)): Path<(i32, Uuid)>,
) -> Result<Json<TripDetail>, AppError> {
    ctx.require(Permission::ViewDb)?;
    state.require_year(year).await?;

    let trip = state.table::<Trip>().require(year, id).await?;
    let section = state.table::<Section>().require(year, trip.section).await?;
    let template = state
        .table::<TripTemplate>()
        .require(year, trip.template)
        .await?;
    let stops = state.table::<Stop>();
    let dropoff_stop = stops.get(year, template.dropoff_stop).await?;
    let pickup_stop = stops.get(year, template.pickup_stop).await?;

    let leaders: Vec<GeneralApplication> = state
        .table::<GeneralApplication>()
        .list(year)
        .await?
        .into_iter()
        .filter(|a| a.leader_supplement.assigned_trip == Some(trip.id))
        .collect();
    let trippees: Vec<IncomingStudent> = state
        .table::<IncomingStudent>()
        .list(year)
        .await?
        .into_iter()
        .filter(|s| s.trip_assignment == Some(trip.id))
        .collect();

    Ok(Json(TripDetail {
        label: trip_label(&section, &template),
        dates: TripDates::for_section(&section),
        routes: EffectiveRoutes::resolve(
            &trip,
            &template,
            dropoff_stop.as_ref(),
            pickup_stop.as_ref(),
        ),
        size: leaders.len() + trippees.len(),
        leaders,
        trippees,
        trip,
        section,
        template,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AssignTrippee {
    pub incoming: Uuid,
}

async fn set_trip_assignment(
    state: &AppState,
    ctx: &RequestContext,
    year: i32,
    trip_id: Uuid,
    incoming: Uuid,
    assign: bool,
) -> Result<IncomingStudent, AppError> {
    let user = ctx.require(Permission::EditDb)?;
    state.require_year(year).await?;
    let trip = state.table::<Trip>().require(year, trip_id).await?;
    let students = state.table::<IncomingStudent>();
    let mut student = students.require(year, incoming).await?;

    if assign {
        student.trip_assignment = Some(trip.id);
    } else if student.trip_assignment == Some(trip.id) {
        student.trip_assignment = None;
    }
    students.update(&student).await?;

    tracing::info!(
        trips_year = year,
        trip = %trip.id,
        incoming = %student.id,
        assigned = assign,
        netid = %user.netid,
        "Changed trippee assignment"
    );
    Ok(student)
}

/// POST /db/{year}/trips/{id}/assign-trippee
pub async fn assign_trippee(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((year, id)): Path<(i32, Uuid)>,
    Json(body): Json<AssignTrippee>,
) -> Result<Json<IncomingStudent>, AppError> {
    Ok(Json(
        set_trip_assignment(&state, &ctx, year, id, body.incoming, true).await?,
    ))
}

/// DELETE /db/{year}/trips/{id}/assign-trippee
pub async fn unassign_trippee(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((year, id)): Path<(i32, Uuid)>,
    Json(body): Json<AssignTrippee>,
) -> Result<Json<IncomingStudent>, AppError> {
    Ok(Json(
        set_trip_assignment(&state, &ctx, year, id, body.incoming, false).await?,
    ))
}

/// GET /db/{year}/trips/{id}/available-trippees - registrations that can go on this trip.
pub async fn available_trippees(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((year, id)): Path<(i32, Uuid)>,
) -> Result<Json<Vec<Registration>>, AppError> {
    ctx.require(Permission::ViewDb)?;
    state.require_year(year).await?;
    let trip = state.table::<Trip>().require(year, id).await?;
    let template = state
        .table::<TripTemplate>()
        .require(year, trip.template)
        .await?;
    let registrations = state.table::<Registration>().list(year).await?;

    Ok(Json(
        available_for_trip(&trip, &template, &registrations)
            .into_iter()
            .cloned()
            .collect(),
    ))
}
