//! Email lists for the directorate to paste into a mail client.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use doctrips_core::applications::GeneralApplication;
use doctrips_core::emails::{
    applicant_lists, incoming_lists, leaders_by_section, leaders_by_triptype, trippee_lists,
    EmailList,
};
use doctrips_core::incoming::{IncomingStudent, Registration};
use doctrips_core::permissions::Permission;
use doctrips_core::storage::RepositoryError;
use doctrips_core::trips::{Section, Trip, TripTemplate, TripType};

use super::AppError;
use crate::context::RequestContext;
use crate::state::AppState;

async fn account_emails(state: &AppState) -> Result<HashMap<Uuid, String>, AppError> {
    Ok(state
        .users
        .list_users()
        .await?
        .into_iter()
        .map(|user| (user.id, user.email))
        .collect())
}

/// GET /db/{year}/emails/{list}
pub async fn show(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((year, list)): Path<(i32, String)>,
) -> Result<Json<Vec<EmailList>>, AppError> {
    ctx.require(Permission::ViewDb)?;
    state.require_year(year).await?;

    let lists = match list.as_str() {
        "applicants" => {
            let applications = state.table::<GeneralApplication>().list(year).await?;
            applicant_lists(&applications, &account_emails(&state).await?)
        }
        "leaders-by-triptype" => leaders_by_triptype(
            &state.table::<GeneralApplication>().list(year).await?,
            &state.table::<Trip>().list(year).await?,
            &state.table::<TripTemplate>().list(year).await?,
            &state.table::<TripType>().list(year).await?,
            &account_emails(&state).await?,
        ),
        "leaders-by-section" => leaders_by_section(
            &state.table::<GeneralApplication>().list(year).await?,
            &state.table::<Trip>().list(year).await?,
            &state.table::<Section>().list(year).await?,
            &account_emails(&state).await?,
        ),
        "incoming" => incoming_lists(
            &state.table::<IncomingStudent>().list(year).await?,
            &state.table::<Registration>().list(year).await?,
            year,
        ),
        "trippees" => trippee_lists(
            &state.table::<IncomingStudent>().list(year).await?,
            &state.table::<Trip>().list(year).await?,
            &state.table::<Section>().list(year).await?,
        ),
        other => return Err(RepositoryError::not_found("email list", other).into()),
    };
    Ok(Json(lists))
}
