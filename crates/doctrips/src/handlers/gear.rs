//! Gear requests from trippees and volunteers.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use doctrips_core::gear::{gear_totals, Gear, GearError, GearRequest, GearTotal, Requester};
use doctrips_core::incoming::IncomingStudent;
use doctrips_core::permissions::{Permission, User};
use doctrips_core::record::RecordKind;

use super::crud::uniqueness_error;
use super::portal::own_application;
use super::AppError;
use crate::context::RequestContext;
use crate::state::AppState;

/// GET /db/{year}/gear-requests/totals
pub async fn totals(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(year): Path<i32>,
) -> Result<Json<Vec<GearTotal>>, AppError> {
    ctx.require(Permission::ViewDb)?;
    state.require_year(year).await?;
    let gear = state.table::<Gear>().list(year).await?;
    let requests = state.table::<GearRequest>().list(year).await?;
    Ok(Json(gear_totals(&gear, &requests)))
}

/// The incoming student with the user's netid, else their volunteer application.
async fn requester_for(state: &AppState, user: &User, year: i32) -> Result<(Requester, String), AppError> {
    let students = state.table::<IncomingStudent>().list(year).await?;
    if let Some(student) = students
        .into_iter()
        .find(|s| s.netid.eq_ignore_ascii_case(&user.netid))
    {
        return Ok((Requester::IncomingStudent(student.id), student.name));
    }
    match own_application(state, user, year).await? {
        Some(application) => Ok((Requester::Volunteer(application.id), application.name)),
        None => Err(GearError::NoRequester.into()),
    }
}

fn is_for(request: &GearRequest, requester: Requester) -> bool {
    request.requester() == Some(requester)
}

/// GET /gear
pub async fn show_request(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Option<GearRequest>>, AppError> {
    let user = ctx.user()?;
    let year = state.require_current_year().await?.year;
    let (requester, _) = requester_for(&state, user, year).await?;
    let requests = state.table::<GearRequest>().list(year).await?;
    Ok(Json(requests.into_iter().find(|r| is_for(r, requester))))
}

#[derive(Debug, Deserialize)]
pub struct GearForm {
    #[serde(default)]
    pub gear: Vec<Uuid>,
    #[serde(default)]
    pub additional: String,
}

/// PUT /gear - create or replace the signed-in user's request.
pub async fn request(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(form): Json<GearForm>,
) -> Result<Json<GearRequest>, AppError> {
    let user = ctx.user()?;
    let year = state.require_current_year().await?.year;
    let (requester, name) = requester_for(&state, user, year).await?;

    let gear = state.table::<Gear>();
    for item in &form.gear {
        gear.require(year, *item).await?;
    }

    let table = state.table::<GearRequest>();
    let existing = table.list(year).await?.into_iter().find(|r| is_for(r, requester));
    let request = match existing {
        Some(mut request) => {
            request.gear = form.gear;
            request.additional = form.additional;
            // Nothing is provided that was not asked for.
            let asked = request.gear.clone();
            request.provided.retain(|item| asked.contains(item));
            request.updated_at = Utc::now();
            table.update(&request).await?;
            request
        }
        None => {
            let mut request = GearRequest::new(year, requester, name);
            request.gear = form.gear;
            request.additional = form.additional;
            table
                .insert(&request)
                .await
                .map_err(|e| uniqueness_error(RecordKind::GearRequest, e))?;
            request
        }
    };

    tracing::info!(
        trips_year = year,
        items = request.gear.len(),
        netid = %user.netid,
        "Gear request saved"
    );
    Ok(Json(request))
}
