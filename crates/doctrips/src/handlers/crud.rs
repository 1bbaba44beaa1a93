//! Year-scoped CRUD for every record kind.
//!
//! Each kind is mounted at `/db/{year}/{path}` and `/db/{year}/{path}/{id}`.
//! Writes go through [`save`], which decodes and validates the payload,
//! checks that references stay inside the year, and maps uniqueness clashes
//! to 409. Deletes follow the `OnDelete` rule of every incoming reference.

use std::collections::{HashMap, HashSet, VecDeque};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use chrono::Utc;
use doctrips_core::applications::GeneralApplication;
use doctrips_core::gear::{GearRequest, Requester};
use doctrips_core::incoming::{IncomingStudent, Registration};
use doctrips_core::permissions::{Permission, User};
use doctrips_core::record::{OnDelete, RecordKind, StoredRecord, ValidationError};
use doctrips_core::storage::{Change, RepositoryError};
use doctrips_core::transport::{ExternalBus, Route, ScheduledTransport, Stop};
use doctrips_core::training::{Attendee, Training, TrainingSession};
use doctrips_core::trips::{trip_label, trip_sort_key, Section, Trip, TripTemplate};

use super::error::Conflict;
use super::flash::{with_flash, FlashMessage};
use super::kinds::{build_record, path_of, unique_fields};
use super::AppError;
use crate::context::RequestContext;
use crate::state::AppState;

/// A stored record as returned by the API.
#[derive(Debug, Serialize)]
pub struct RecordView {
    pub id: Uuid,
    pub label: String,
    pub data: Value,
}

impl From<StoredRecord> for RecordView {
    fn from(record: StoredRecord) -> Self {
        Self {
            id: record.id,
            label: record.label,
            data: record.data,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Write {
    Create,
    Update,
}

/// Routes for one kind.
pub fn kind_routes(kind: RecordKind) -> Router<AppState> {
    let path = path_of(kind);
    Router::new()
        .route(
            &format!("/db/{{year}}/{path}"),
            get(
                move |State(state): State<AppState>,
                      ctx: RequestContext,
                      Path(year): Path<i32>,
                      Query(query): Query<ListQuery>| {
                    list(state, ctx, kind, year, query)
                },
            )
            .post(
                move |State(state): State<AppState>,
                      ctx: RequestContext,
                      Path(year): Path<i32>,
                      Json(payload): Json<Value>| {
                    create(state, ctx, kind, year, payload)
                },
            ),
        )
        .route(
            &format!("/db/{{year}}/{path}/{{id}}"),
            get(
                move |State(state): State<AppState>,
                      ctx: RequestContext,
                      Path((year, id)): Path<(i32, Uuid)>| {
                    show(state, ctx, kind, year, id)
                },
            )
            .put(
                move |State(state): State<AppState>,
                      ctx: RequestContext,
                      Path((year, id)): Path<(i32, Uuid)>,
                      Json(payload): Json<Value>| {
                    update(state, ctx, kind, year, id, payload)
                },
            )
            .delete(
                move |State(state): State<AppState>,
                      ctx: RequestContext,
                      Path((year, id)): Path<(i32, Uuid)>| {
                    delete(state, ctx, kind, year, id)
                },
            ),
        )
}

async fn list(
    state: AppState,
    ctx: RequestContext,
    kind: RecordKind,
    year: i32,
    query: ListQuery,
) -> Result<Json<Vec<RecordView>>, AppError> {
    ctx.require(read_permission(kind))?;
    state.require_year(year).await?;

    let records = state.records.list(kind, year).await?;
    let records = records
        .into_iter()
        .filter(|r| match &query.status {
            Some(status) => r
                .data
                .get("status")
                .and_then(Value::as_str)
                .is_some_and(|s| s.eq_ignore_ascii_case(status)),
            None => true,
        })
        .map(RecordView::from)
        .collect();
    Ok(Json(records))
}

async fn show(
    state: AppState,
    ctx: RequestContext,
    kind: RecordKind,
    year: i32,
    id: Uuid,
) -> Result<Json<RecordView>, AppError> {
    ctx.require(read_permission(kind))?;
    state.require_year(year).await?;
    Ok(Json(state.records.require(kind, year, id).await?.into()))
}

async fn create(
    state: AppState,
    ctx: RequestContext,
    kind: RecordKind,
    year: i32,
    mut payload: Value,
) -> Result<(StatusCode, Json<RecordView>), AppError> {
    let user = ctx.require(write_permission(kind))?;
    state.require_year(year).await?;

    stamp_author(kind, &mut payload, user, None)?;
    let record = save(&state, kind, year, Uuid::new_v4(), payload, Write::Create).await?;
    tracing::info!(
        trips_year = year,
        kind = kind.as_str(),
        id = %record.id,
        netid = %user.netid,
        "Created record"
    );
    Ok((StatusCode::CREATED, Json(record.into())))
}

async fn update(
    state: AppState,
    ctx: RequestContext,
    kind: RecordKind,
    year: i32,
    id: Uuid,
    mut payload: Value,
) -> Result<Json<RecordView>, AppError> {
    let user = ctx.require(write_permission(kind))?;
    state.require_year(year).await?;
    let existing = state.records.require(kind, year, id).await?;

    stamp_author(kind, &mut payload, user, Some(&existing.data))?;
    let record = save(&state, kind, year, id, payload, Write::Update).await?;
    tracing::info!(
        trips_year = year,
        kind = kind.as_str(),
        id = %id,
        netid = %user.netid,
        "Updated record"
    );
    Ok(Json(record.into()))
}

/// Permission needed to read records of `kind`.
pub fn read_permission(kind: RecordKind) -> Permission {
    match kind {
        RecordKind::Incident | RecordKind::IncidentUpdate => Permission::ReportIncidents,
        _ => Permission::ViewDb,
    }
}

/// Permission needed to create or change records of `kind`.
pub fn write_permission(kind: RecordKind) -> Permission {
    match kind {
        RecordKind::Incident | RecordKind::IncidentUpdate => Permission::ReportIncidents,
        RecordKind::Training | RecordKind::TrainingSession | RecordKind::Attendee => {
            Permission::EditTrainings
        }
        // Anyone with database access may plan a raid.
        RecordKind::Raid | RecordKind::RaidComment => Permission::ViewDb,
        _ => Permission::EditDb,
    }
}

fn delete_permission(kind: RecordKind) -> Permission {
    match kind {
        RecordKind::Raid | RecordKind::RaidComment => Permission::EditDb,
        other => write_permission(other),
    }
}

/// Kinds that record who entered them and when.
const AUTHORED: [RecordKind; 4] = [
    RecordKind::Raid,
    RecordKind::RaidComment,
    RecordKind::Incident,
    RecordKind::IncidentUpdate,
];

/// Sets the author fields from the signed-in user on create and keeps the
/// stored ones on update. Gear requests get their timestamps the same way.
fn stamp_author(
    kind: RecordKind,
    payload: &mut Value,
    user: &User,
    existing: Option<&Value>,
) -> Result<(), AppError> {
    let (author_fields, created_field): (&[&str], &str) = if AUTHORED.contains(&kind) {
        (&["user", "netid"], "created")
    } else if kind == RecordKind::GearRequest {
        (&[], "created_at")
    } else {
        return Ok(());
    };
    let fields = payload
        .as_object_mut()
        .ok_or_else(|| ValidationError("expected a JSON object".to_string()))?;
    let now = json!(Utc::now());

    match existing {
        None => {
            if !author_fields.is_empty() {
                fields.insert("user".to_string(), json!(user.id));
                fields.insert("netid".to_string(), json!(user.netid));
            }
            fields.insert(created_field.to_string(), now.clone());
        }
        Some(previous) => {
            for field in author_fields.iter().chain([&created_field]) {
                if let Some(value) = previous.get(*field) {
                    fields.insert(field.to_string(), value.clone());
                }
            }
        }
    }
    if kind == RecordKind::GearRequest {
        fields.insert("updated_at".to_string(), now);
    }
    Ok(())
}

/// Decodes, checks and stores a record document with the given id and year.
pub async fn save(
    state: &AppState,
    kind: RecordKind,
    year: i32,
    id: Uuid,
    mut payload: Value,
    mode: Write,
) -> Result<StoredRecord, AppError> {
    let fields = payload
        .as_object_mut()
        .ok_or_else(|| ValidationError("expected a JSON object".to_string()))?;
    fields.insert("id".to_string(), json!(id));
    fields.insert("trips_year".to_string(), json!(year));

    let mut record = build_record(kind, payload)?;
    check_references(state, &record).await?;
    annotate(state, &mut record).await?;

    let mut changes = Vec::new();
    match mode {
        Write::Create => {
            link_on_create(state, &mut record, &mut changes).await?;
            changes.insert(0, Change::Insert(record.clone()));
        }
        Write::Update => {
            relabel_trips(state, &record, &mut changes).await?;
            changes.insert(0, Change::Update(record.clone()));
        }
    }

    state
        .records
        .commit(changes)
        .await
        .map_err(|e| uniqueness_error(kind, e))?;
    Ok(record)
}

/// 409 with the clashing fields for unique-key violations.
pub fn uniqueness_error(kind: RecordKind, error: RepositoryError) -> AppError {
    match error {
        RepositoryError::AlreadyExists { .. } => Conflict(format!(
            "{} with this {} already exists",
            kind.display_name(),
            unique_fields(kind)
        ))
        .into(),
        other => other.into(),
    }
}

/// Every referenced record must exist, be of the expected kind and share the year.
///
/// Runs before the derived-field lookups; `commit` enforces the same rule
/// atomically.
async fn check_references(state: &AppState, record: &StoredRecord) -> Result<(), AppError> {
    for reference in &record.references {
        match state.records.get(reference.kind, reference.target).await? {
            Some(target) if target.trips_year == record.trips_year => {}
            _ => {
                return Err(ValidationError(format!(
                    "{} {} does not exist in trips year {}",
                    reference.kind,
                    reference.target,
                    record.trips_year
                ))
                .into())
            }
        }
    }
    Ok(())
}

/// Checks and derived fields that need other records.
async fn annotate(state: &AppState, record: &mut StoredRecord) -> Result<(), AppError> {
    let year = record.trips_year;
    match record.kind {
        RecordKind::Trip => {
            let trip: Trip = record.decode()?;
            let section: Section = state.table().require(year, trip.section).await?;
            let template: TripTemplate = state.table().require(year, trip.template).await?;
            record.label = trip_label(&section, &template);
            record.sort_key = trip_sort_key(&section, &template);
        }
        RecordKind::Stop => {
            let stop: Stop = record.decode()?;
            let category = match stop.route {
                Some(route) => Some(state.table::<Route>().require(year, route).await?.category),
                None => None,
            };
            stop.validate_for_route(category)?;
        }
        RecordKind::ScheduledTransport => {
            let transport: ScheduledTransport = record.decode()?;
            let route: Route = state.table().require(year, transport.route).await?;
            ScheduledTransport::check_route(&route)?;
        }
        RecordKind::ExternalBus => {
            let bus: ExternalBus = record.decode()?;
            let route: Route = state.table().require(year, bus.route).await?;
            ExternalBus::check_route(&route)?;
        }
        RecordKind::TrainingSession => {
            let session: TrainingSession = record.decode()?;
            let training: Training = state.table().require(year, session.training).await?;
            record.label = session.label_for(&training);
        }
        RecordKind::Attendee => {
            let mut attendee: Attendee = record.decode()?;
            let volunteer: GeneralApplication = state.table().require(year, attendee.volunteer).await?;
            attendee.name = volunteer.name;
            *record = StoredRecord::encode(&attendee)?;
        }
        RecordKind::GearRequest => {
            let mut request: GearRequest = record.decode()?;
            request.name = match request.requester() {
                Some(Requester::IncomingStudent(id)) => {
                    state.table::<IncomingStudent>().require(year, id).await?.name
                }
                Some(Requester::Volunteer(id)) => {
                    state.table::<GeneralApplication>().require(year, id).await?.name
                }
                None => request.name,
            };
            *record = StoredRecord::encode(&request)?;
        }
        _ => {}
    }
    Ok(())
}

/// Links a new student or registration to its counterpart with the same netid.
async fn link_on_create(
    state: &AppState,
    record: &mut StoredRecord,
    changes: &mut Vec<Change>,
) -> Result<(), AppError> {
    let year = record.trips_year;
    match record.kind {
        RecordKind::IncomingStudent => {
            let mut student: IncomingStudent = record.decode()?;
            if student.registration.is_none() {
                let registrations = state.table::<Registration>().list(year).await?;
                let linked = doctrips_core::incoming::registration_for_student(&student, &registrations);
                if let Some(registration) = linked {
                    student.registration = Some(registration.id);
                    *record = StoredRecord::encode(&student)?;
                }
            }
        }
        RecordKind::Registration => {
            let registration: Registration = record.decode()?;
            let students = state.table::<IncomingStudent>().list(year).await?;
            let matched = doctrips_core::incoming::student_for_registration(&registration, &students);
            if let Some(student) = matched.filter(|s| s.registration.is_none()) {
                let mut student = student.clone();
                student.registration = Some(registration.id);
                changes.push(Change::Update(StoredRecord::encode(&student)?));
            }
        }
        _ => {}
    }
    Ok(())
}

/// Trip labels embed section and template names, so renames relabel trips.
async fn relabel_trips(
    state: &AppState,
    record: &StoredRecord,
    changes: &mut Vec<Change>,
) -> Result<(), AppError> {
    if !matches!(record.kind, RecordKind::Section | RecordKind::TripTemplate) {
        return Ok(());
    }
    let year = record.trips_year;
    for source in state.records.referencing(record.id).await? {
        if source.kind != RecordKind::Trip || source.trips_year != year {
            continue;
        }
        let trip: Trip = source.decode()?;
        let section: Section = if trip.section == record.id {
            record.decode()?
        } else {
            state.table().require(year, trip.section).await?
        };
        let template: TripTemplate = if trip.template == record.id {
            record.decode()?
        } else {
            state.table().require(year, trip.template).await?
        };
        let mut relabeled = source;
        relabeled.label = trip_label(&section, &template);
        relabeled.sort_key = trip_sort_key(&section, &template);
        changes.push(Change::Update(relabeled));
    }
    Ok(())
}

async fn delete(
    state: AppState,
    ctx: RequestContext,
    kind: RecordKind,
    year: i32,
    id: Uuid,
) -> Result<Response, AppError> {
    let user = ctx.require(delete_permission(kind))?;
    state.require_year(year).await?;
    let target = state.records.require(kind, year, id).await?;

    // Everything removed along with the target through cascades.
    let mut doomed = vec![target.clone()];
    let mut doomed_ids: HashSet<Uuid> = HashSet::from([target.id]);
    let mut queue = VecDeque::from([target.id]);
    while let Some(current) = queue.pop_front() {
        for source in state.records.referencing(current).await? {
            if doomed_ids.contains(&source.id) {
                continue;
            }
            if source
                .references_to(current)
                .any(|r| r.on_delete == OnDelete::Cascade)
            {
                doomed_ids.insert(source.id);
                queue.push_back(source.id);
                doomed.push(source);
            }
        }
    }

    let mut protecting: Vec<String> = Vec::new();
    let mut detached: HashMap<Uuid, StoredRecord> = HashMap::new();
    for record in &doomed {
        for source in state.records.referencing(record.id).await? {
            if doomed_ids.contains(&source.id) {
                continue;
            }
            if source
                .references_to(record.id)
                .any(|r| r.on_delete == OnDelete::Protect)
            {
                if !protecting.contains(&source.label) {
                    protecting.push(source.label.clone());
                }
                continue;
            }
            detached
                .entry(source.id)
                .or_insert(source)
                .detach(record.id)?;
        }
    }

    if !protecting.is_empty() {
        tracing::warn!(
            trips_year = year,
            kind = kind.as_str(),
            id = %id,
            netid = %user.netid,
            "Delete blocked by protected references"
        );
        return Ok(blocked(kind, &target.label, &protecting));
    }

    let mut changes: Vec<Change> = detached.into_values().map(Change::Update).collect();
    changes.extend(doomed.iter().map(|r| Change::Delete {
        kind: r.kind,
        id: r.id,
    }));
    match state.records.commit(changes).await {
        Ok(()) => {}
        // A reference created after the scan above.
        Err(RepositoryError::Protected { referenced_by, .. }) => {
            tracing::warn!(
                trips_year = year,
                kind = kind.as_str(),
                id = %id,
                netid = %user.netid,
                "Delete blocked by a concurrent reference"
            );
            return Ok(blocked(kind, &target.label, &referenced_by));
        }
        Err(other) => return Err(other.into()),
    }

    tracing::info!(
        trips_year = year,
        kind = kind.as_str(),
        id = %id,
        cascaded = doomed.len() - 1,
        netid = %user.netid,
        "Deleted record"
    );
    let message = format!("Succesfully deleted {}", target.label);
    Ok(with_flash(
        (StatusCode::OK, Json(json!({ "message": message }))),
        FlashMessage::success(message),
    ))
}

fn blocked(kind: RecordKind, label: &str, protecting: &[String]) -> Response {
    let message = format!(
        "Oops, you can't delete {} {} because the following objects reference it: {}.",
        kind,
        label,
        protecting.join(", ")
    );
    with_flash(
        (StatusCode::CONFLICT, Json(json!({ "message": message }))),
        FlashMessage::error(message),
    )
}
