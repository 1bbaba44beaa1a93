//! Trips years: listing, the landing summary and forwarding into a new year.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use doctrips_core::permissions::Permission;
use doctrips_core::record::RecordKind;
use doctrips_core::storage::Change;
use doctrips_core::timetable::Timetable;
use doctrips_core::years::{
    forward_records, scrub_medical_info, ForwardError, TripsYear, YearSummary, FORWARD_ORDER,
    MEDICAL_KINDS,
};

use super::error::Conflict;
use super::AppError;
use crate::context::RequestContext;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateYear {
    pub year: i32,
}

/// GET /db/ - redirect to the current year.
pub async fn current(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Redirect, AppError> {
    ctx.require(Permission::ViewDb)?;
    let year = state.require_current_year().await?;
    Ok(Redirect::to(&format!("/db/{}/", year.year)))
}

/// GET /db/years
pub async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Vec<TripsYear>>, AppError> {
    ctx.require(Permission::ViewDb)?;
    Ok(Json(state.years.list_years().await?))
}

/// POST /db/years - create the first year of an empty database.
pub async fn create_initial(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(body): Json<CreateYear>,
) -> Result<(StatusCode, Json<TripsYear>), AppError> {
    let user = ctx.require(Permission::EditDb)?;
    if !state.years.list_years().await?.is_empty() {
        return Err(Conflict("Trips years already exist; use forward to add one".to_string()).into());
    }

    let year = TripsYear::new(body.year, true);
    state.years.create_year(&year).await?;
    tracing::info!(trips_year = year.year, netid = %user.netid, "Created initial trips year");
    Ok((StatusCode::CREATED, Json(year)))
}

/// GET /db/{year}/ - the year and how many records of each kind it holds.
pub async fn summary(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(year): Path<i32>,
) -> Result<Json<YearSummary>, AppError> {
    ctx.require(Permission::ViewDb)?;
    let trips_year = state.require_year(year).await?;

    let mut counts = Vec::with_capacity(RecordKind::ALL.len());
    for kind in RecordKind::ALL {
        counts.push((kind, state.records.list(kind, year).await?.len()));
    }
    Ok(Json(YearSummary { trips_year, counts }))
}

/// POST /db/{year}/forward - copy reusable records into `year + 1` and make it current.
///
/// The retired year's medical information is erased in the same commit and
/// the timetable is reset afterwards.
pub async fn forward(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(year): Path<i32>,
) -> Result<(StatusCode, Json<TripsYear>), AppError> {
    let user = ctx.require(Permission::EditDb)?;
    let trips_year = state.require_year(year).await?;
    if !trips_year.is_current {
        return Err(ForwardError::NotCurrent(year).into());
    }

    let mut records = Vec::new();
    for kind in FORWARD_ORDER {
        records.extend(state.records.list(kind, year).await?);
    }
    let next = trips_year.next();
    let copies = forward_records(&records, next.year)?;
    let copied = copies.len();

    let mut medical = Vec::new();
    for kind in MEDICAL_KINDS {
        medical.extend(state.records.list(kind, year).await?);
    }
    let scrubbed = scrub_medical_info(&medical)?;
    let scrubbed_count = scrubbed.len();

    let changes = copies
        .into_iter()
        .map(Change::Insert)
        .chain(scrubbed.into_iter().map(Change::Update))
        .collect();
    state.years.advance(year, &next, changes).await?;
    state
        .timetable
        .update_timetable(&Timetable::starting_at(Utc::now()))
        .await?;
    tracing::info!(
        from = year,
        to = next.year,
        copied,
        scrubbed = scrubbed_count,
        netid = %user.netid,
        "Forwarded database to next trips year"
    );
    Ok((StatusCode::CREATED, Json(next)))
}
