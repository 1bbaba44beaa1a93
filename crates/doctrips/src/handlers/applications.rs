//! Leader and croo assignment of volunteer applications.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use doctrips_core::applications::{available_trips, preferred_trips, Croo, GeneralApplication};
use doctrips_core::permissions::Permission;
use doctrips_core::trips::{Trip, TripTemplate};

use super::AppError;
use crate::context::RequestContext;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LeaderTrips {
    pub preferred: Vec<Trip>,
    pub available: Vec<Trip>,
}

/// GET /db/{year}/applications/{id}/trips - trips the applicant prefers or
/// is available to lead.
pub async fn leader_trips(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((year, id)): Path<(i32, Uuid)>,
) -> Result<Json<LeaderTrips>, AppError> {
    ctx.require(Permission::ViewDb)?;
    state.require_year(year).await?;
    let application = state.table::<GeneralApplication>().require(year, id).await?;
    let trips = state.table::<Trip>().list(year).await?;
    let templates = state.table::<TripTemplate>().list(year).await?;

    let supplement = &application.leader_supplement;
    Ok(Json(LeaderTrips {
        preferred: preferred_trips(supplement, &trips, &templates)
            .into_iter()
            .cloned()
            .collect(),
        available: available_trips(supplement, &trips, &templates)
            .into_iter()
            .cloned()
            .collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct AssignTrip {
    pub trip: Option<Uuid>,
}

/// PUT /db/{year}/applications/{id}/assign-trip - assign or clear the leader trip.
pub async fn assign_trip(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((year, id)): Path<(i32, Uuid)>,
    Json(body): Json<AssignTrip>,
) -> Result<Json<GeneralApplication>, AppError> {
    let user = ctx.require(Permission::EditApplicationsAndAssignLeaders)?;
    state.require_year(year).await?;
    if let Some(trip) = body.trip {
        state.table::<Trip>().require(year, trip).await?;
    }

    let applications = state.table::<GeneralApplication>();
    let mut application = applications.require(year, id).await?;
    application.assign_trip(body.trip);
    applications.update(&application).await?;

    tracing::info!(
        trips_year = year,
        application = %application.id,
        trip = ?body.trip,
        netid = %user.netid,
        "Assigned leader trip"
    );
    Ok(Json(application))
}

#[derive(Debug, Deserialize)]
pub struct AssignCroo {
    pub croo: Option<Uuid>,
}

/// PUT /db/{year}/applications/{id}/assign-croo
pub async fn assign_croo(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((year, id)): Path<(i32, Uuid)>,
    Json(body): Json<AssignCroo>,
) -> Result<Json<GeneralApplication>, AppError> {
    let user = ctx.require(Permission::EditApplicationsAndAssignLeaders)?;
    state.require_year(year).await?;
    if let Some(croo) = body.croo {
        state.table::<Croo>().require(year, croo).await?;
    }

    let applications = state.table::<GeneralApplication>();
    let mut application = applications.require(year, id).await?;
    application.assign_croo(body.croo);
    applications.update(&application).await?;

    tracing::info!(
        trips_year = year,
        application = %application.id,
        croo = ?body.croo,
        netid = %user.netid,
        "Assigned croo"
    );
    Ok(Json(application))
}
