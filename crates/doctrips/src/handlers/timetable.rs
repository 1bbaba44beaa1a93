use axum::{extract::State, Json};

use doctrips_core::permissions::Permission;
use doctrips_core::timetable::Timetable;

use super::AppError;
use crate::context::RequestContext;
use crate::state::AppState;

/// GET /timetable
pub async fn show(State(state): State<AppState>) -> Result<Json<Timetable>, AppError> {
    Ok(Json(state.timetable.get_timetable().await?))
}

/// PUT /timetable
pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(timetable): Json<Timetable>,
) -> Result<Json<Timetable>, AppError> {
    let user = ctx.require(Permission::EditTimetable)?;
    state.timetable.update_timetable(&timetable).await?;
    tracing::info!(netid = %user.netid, "Updated timetable");
    Ok(Json(timetable))
}
