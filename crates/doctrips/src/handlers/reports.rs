//! Year statistics and CSV downloads.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};

use doctrips_core::applications::GeneralApplication;
use doctrips_core::incoming::{IncomingSettings, IncomingStudent, Registration};
use doctrips_core::permissions::Permission;
use doctrips_core::reports::{statistics, tshirt_counts, ReportKind, Statistics, Tshirts, YearData};
use doctrips_core::transport::Stop;
use doctrips_core::trips::{Section, Trip, TripTemplate};

use super::AppError;
use crate::context::RequestContext;
use crate::state::AppState;

/// GET /db/{year}/reports/statistics
pub async fn year_statistics(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(year): Path<i32>,
) -> Result<Json<Statistics>, AppError> {
    ctx.require(Permission::ViewDb)?;
    state.require_year(year).await?;
    let students = state.table::<IncomingStudent>().list(year).await?;
    Ok(Json(statistics(&students)))
}

/// GET /db/{year}/reports/tshirts
pub async fn tshirts(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(year): Path<i32>,
) -> Result<Json<Tshirts>, AppError> {
    ctx.require(Permission::ViewDb)?;
    state.require_year(year).await?;
    let applications = state.table::<GeneralApplication>().list(year).await?;
    let registrations = state.table::<Registration>().list(year).await?;
    Ok(Json(tshirt_counts(&applications, &registrations)))
}

/// GET /db/{year}/reports/{report}, e.g. `charges.csv`.
pub async fn download(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((year, report)): Path<(i32, String)>,
) -> Result<impl IntoResponse, AppError> {
    let user = ctx.require(Permission::ViewDb)?;
    let kind = ReportKind::from_path(&report)?;
    state.require_year(year).await?;

    let applications = state.table::<GeneralApplication>().list(year).await?;
    let students = state.table::<IncomingStudent>().list(year).await?;
    let registrations = state.table::<Registration>().list(year).await?;
    let trips = state.table::<Trip>().list(year).await?;
    let sections = state.table::<Section>().list(year).await?;
    let templates = state.table::<TripTemplate>().list(year).await?;
    let stops = state.table::<Stop>().list(year).await?;
    let settings = state.table::<IncomingSettings>().list(year).await?;

    let data = YearData {
        trips_year: year,
        applications: &applications,
        students: &students,
        registrations: &registrations,
        trips: &trips,
        sections: &sections,
        templates: &templates,
        stops: &stops,
        settings: settings.first(),
    };
    let body = kind.build(&data)?.to_csv()?;

    tracing::info!(trips_year = year, report = %report, netid = %user.netid, "Exported report");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", kind.filename(year)),
            ),
        ],
        body,
    ))
}
