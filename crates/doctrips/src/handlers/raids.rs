//! Raids planned against trips.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use doctrips_core::permissions::Permission;
use doctrips_core::raids::{raids_by_trip, Raid, RaidComment};
use doctrips_core::record::RecordKind;

use super::AppError;
use crate::context::RequestContext;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TripRaids {
    pub trip: Uuid,
    pub label: String,
    pub raids: Vec<Raid>,
}

/// GET /db/{year}/raids/trips - every trip with the raids planned against it.
pub async fn trips(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(year): Path<i32>,
) -> Result<Json<Vec<TripRaids>>, AppError> {
    ctx.require(Permission::ViewDb)?;
    state.require_year(year).await?;

    let raids = state.table::<Raid>().list(year).await?;
    let by_trip = raids_by_trip(&raids);
    let trips = state.records.list(RecordKind::Trip, year).await?;
    Ok(Json(
        trips
            .into_iter()
            .map(|trip| TripRaids {
                raids: by_trip
                    .get(&trip.id)
                    .map(|planned| planned.iter().map(|r| (*r).clone()).collect())
                    .unwrap_or_default(),
                trip: trip.id,
                label: trip.label,
            })
            .collect(),
    ))
}

/// GET /db/{year}/raids/{id}/comments
pub async fn comments(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((year, id)): Path<(i32, Uuid)>,
) -> Result<Json<Vec<RaidComment>>, AppError> {
    ctx.require(Permission::ViewDb)?;
    state.require_year(year).await?;
    state.table::<Raid>().require(year, id).await?;
    let comments = state.table::<RaidComment>().list(year).await?;
    Ok(Json(comments.into_iter().filter(|c| c.raid == id).collect()))
}
