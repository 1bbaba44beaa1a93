//! Internal and external bus scheduling views and driving directions.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use doctrips_core::applications::GeneralApplication;
use doctrips_core::incoming::{external_riders, IncomingStudent};
use doctrips_core::permissions::Permission;
use doctrips_core::storage::RepositoryError;
use doctrips_core::transport::{
    actual_rider_matrix, all_trip_dates, external_bus_matrix, external_stops_from_hanover,
    external_stops_to_hanover, internal_bus_stops, internal_rider_matrix, internal_route_matrix,
    issues_matrix, leg_counts, passenger_matrix, riders_on, route_capacities, BusLoad,
    BusSchedule, Direction, ExternalBus, ExternalBusMatrix, IssueMatrix, Leg, LegCounts,
    Passenger, PassengerMatrix, RiderMatrix, Route, RouteMatrix, ScheduledTransport, Stop,
    TransportConfig, TransportedTrip, Vehicle,
};
use doctrips_core::trips::{Section, Trip, TripTemplate};

use super::AppError;
use crate::context::RequestContext;
use crate::services::route_directions;
use crate::state::AppState;

fn stop_map(stops: Vec<Stop>) -> HashMap<Uuid, Stop> {
    stops.into_iter().map(|s| (s.id, s)).collect()
}

/// Every trip of the year resolved for transport, sized by its assigned
/// trippees and leaders.
async fn transported_trips(
    state: &AppState,
    year: i32,
    sections: &[Section],
    stops: &HashMap<Uuid, Stop>,
) -> Result<Vec<TransportedTrip>, AppError> {
    let templates: HashMap<Uuid, TripTemplate> = state
        .table::<TripTemplate>()
        .list(year)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();
    let sections: HashMap<Uuid, &Section> = sections.iter().map(|s| (s.id, s)).collect();

    let mut sizes: HashMap<Uuid, u32> = HashMap::new();
    for student in state.table::<IncomingStudent>().list(year).await? {
        if let Some(trip) = student.trip_assignment {
            *sizes.entry(trip).or_default() += 1;
        }
    }
    for application in state.table::<GeneralApplication>().list(year).await? {
        if let Some(trip) = application.leader_supplement.assigned_trip {
            *sizes.entry(trip).or_default() += 1;
        }
    }

    let trips = state.table::<Trip>().list(year).await?;
    Ok(trips
        .iter()
        .filter_map(|trip| {
            let section = sections.get(&trip.section)?;
            let template = templates.get(&trip.template)?;
            let size = sizes.get(&trip.id).copied().unwrap_or(0);
            Some(TransportedTrip::new(trip, section, template, stops, size))
        })
        .collect())
}

async fn transport_config(state: &AppState, year: i32) -> Result<TransportConfig, AppError> {
    state
        .table::<TransportConfig>()
        .list(year)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| RepositoryError::not_found("transport_config", year).into())
}

/// Capacity of the vehicle assigned to `route`.
async fn capacity_of(state: &AppState, route: &Route) -> Result<u32, AppError> {
    let vehicle = state
        .table::<Vehicle>()
        .require(route.trips_year, route.vehicle)
        .await?;
    Ok(vehicle.capacity)
}

fn require_stop<'a>(stops: &'a HashMap<Uuid, Stop>, id: Uuid) -> Result<&'a Stop, AppError> {
    stops
        .get(&id)
        .ok_or_else(|| RepositoryError::not_found("stop", id).into())
}

#[derive(Debug, Serialize)]
pub struct InternalTransportView {
    pub routes: Vec<Route>,
    pub dates: Vec<NaiveDate>,
    pub scheduled: RouteMatrix,
    /// Riders if every trip were full.
    pub riders: RiderMatrix,
    pub actual_riders: RiderMatrix,
    pub issues: IssueMatrix,
    pub actual_issues: IssueMatrix,
    pub leg_counts: LegCounts,
}

/// GET /db/{year}/transport/internal
pub async fn internal(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(year): Path<i32>,
) -> Result<Json<InternalTransportView>, AppError> {
    ctx.require(Permission::ViewDb)?;
    state.require_year(year).await?;

    let routes = state.table::<Route>().list(year).await?;
    let sections = state.table::<Section>().list(year).await?;
    let vehicles = state.table::<Vehicle>().list(year).await?;
    let transports = state.table::<ScheduledTransport>().list(year).await?;
    let stops = stop_map(state.table::<Stop>().list(year).await?);
    let trips = transported_trips(&state, year, &sections, &stops).await?;

    let scheduled = internal_route_matrix(&routes, &sections, &transports);
    let riders = internal_rider_matrix(&routes, &sections, &trips);
    let actual_riders = actual_rider_matrix(&routes, &sections, &trips);
    let capacities = route_capacities(&routes, &vehicles);
    let issues = issues_matrix(&scheduled, &riders, &capacities);
    let actual_issues = issues_matrix(&scheduled, &actual_riders, &capacities);

    Ok(Json(InternalTransportView {
        dates: all_trip_dates(&sections),
        leg_counts: leg_counts(&routes, &sections, &trips),
        routes: routes.into_iter().filter(Route::is_internal).collect(),
        scheduled,
        riders,
        actual_riders,
        issues,
        actual_issues,
    }))
}

async fn internal_schedule(
    state: &AppState,
    year: i32,
    id: Uuid,
) -> Result<(ScheduledTransport, BusSchedule), AppError> {
    state.require_year(year).await?;
    let transport = state
        .table::<ScheduledTransport>()
        .require(year, id)
        .await?;
    let route = state.table::<Route>().require(year, transport.route).await?;
    let capacity = capacity_of(state, &route).await?;
    let config = transport_config(state, year).await?;

    let sections = state.table::<Section>().list(year).await?;
    let stops = stop_map(state.table::<Stop>().list(year).await?);
    let trips = transported_trips(state, year, &sections, &stops).await?;
    let hanover = require_stop(&stops, config.hanover)?;
    let lodge = require_stop(&stops, config.lodge)?;

    let load = BusLoad::for_transport(&transport, &trips);
    let schedule = internal_bus_stops(&load, &stops, hanover, lodge, capacity);
    Ok((transport, schedule))
}

/// GET /db/{year}/scheduled-transports/{id}/stops
pub async fn internal_stops(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((year, id)): Path<(i32, Uuid)>,
) -> Result<Json<BusSchedule>, AppError> {
    ctx.require(Permission::ViewDb)?;
    let (_, schedule) = internal_schedule(&state, year, id).await?;
    Ok(Json(schedule))
}

#[derive(Debug, Serialize)]
pub struct DirectionsView {
    pub schedule: BusSchedule,
    pub legs: Vec<Leg>,
}

async fn directions_for(state: &AppState, schedule: BusSchedule) -> Result<DirectionsView, AppError> {
    let stops: Vec<Stop> = schedule.locations().into_iter().cloned().collect();
    let legs = route_directions(&*state.maps, &stops).await?;
    Ok(DirectionsView { schedule, legs })
}

/// GET /db/{year}/scheduled-transports/{id}/directions
pub async fn internal_directions(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((year, id)): Path<(i32, Uuid)>,
) -> Result<Json<DirectionsView>, AppError> {
    ctx.require(Permission::ViewDb)?;
    let (transport, schedule) = internal_schedule(&state, year, id).await?;
    let view = directions_for(&state, schedule).await?;
    tracing::debug!(transport = %transport.id, legs = view.legs.len(), "Fetched directions");
    Ok(Json(view))
}

#[derive(Debug, Serialize)]
pub struct ExternalTransportView {
    pub routes: Vec<Route>,
    pub sections: Vec<Section>,
    pub scheduled: ExternalBusMatrix,
    pub to_hanover: PassengerMatrix,
    pub from_hanover: PassengerMatrix,
}

/// GET /db/{year}/transport/external
pub async fn external(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(year): Path<i32>,
) -> Result<Json<ExternalTransportView>, AppError> {
    ctx.require(Permission::ViewDb)?;
    state.require_year(year).await?;

    let routes = state.table::<Route>().list(year).await?;
    let sections = state.table::<Section>().list(year).await?;
    let buses = state.table::<ExternalBus>().list(year).await?;
    let stops = stop_map(state.table::<Stop>().list(year).await?);
    let students = state.table::<IncomingStudent>().list(year).await?;
    let trips = state.table::<Trip>().list(year).await?;
    let riders = external_riders(&students, &trips);

    Ok(Json(ExternalTransportView {
        scheduled: external_bus_matrix(&routes, &sections, &buses),
        to_hanover: passenger_matrix(&routes, &sections, &riders, &stops, Direction::ToHanover),
        from_hanover: passenger_matrix(&routes, &sections, &riders, &stops, Direction::FromHanover),
        routes: routes.into_iter().filter(|r| !r.is_internal()).collect(),
        sections: sections.into_iter().filter(|s| s.is_local).collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct DirectionQuery {
    pub direction: Direction,
}

async fn external_schedule(
    state: &AppState,
    year: i32,
    id: Uuid,
    direction: Direction,
) -> Result<BusSchedule, AppError> {
    state.require_year(year).await?;
    let bus = state.table::<ExternalBus>().require(year, id).await?;
    let route = state.table::<Route>().require(year, bus.route).await?;
    let capacity = capacity_of(state, &route).await?;
    let config = transport_config(state, year).await?;

    let stops = stop_map(state.table::<Stop>().list(year).await?);
    let students = state.table::<IncomingStudent>().list(year).await?;
    let trips = state.table::<Trip>().list(year).await?;
    let riders = external_riders(&students, &trips);
    let names: HashMap<Uuid, &str> = students.iter().map(|s| (s.id, s.name.as_str())).collect();

    let passengers: Vec<Passenger> = riders_on(&bus, &riders, &stops, direction)
        .into_iter()
        .map(|(rider, stop)| Passenger {
            id: rider.student,
            name: names.get(&rider.student).copied().unwrap_or_default().to_string(),
            stop,
        })
        .collect();

    let hanover = require_stop(&stops, config.hanover)?;
    Ok(match direction {
        Direction::ToHanover => external_stops_to_hanover(&passengers, &stops, hanover, capacity),
        Direction::FromHanover => {
            external_stops_from_hanover(&passengers, &stops, hanover, capacity)
        }
    })
}

/// GET /db/{year}/external-buses/{id}/stops?direction=to_hanover
pub async fn external_stops(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((year, id)): Path<(i32, Uuid)>,
    Query(query): Query<DirectionQuery>,
) -> Result<Json<BusSchedule>, AppError> {
    ctx.require(Permission::ViewDb)?;
    Ok(Json(
        external_schedule(&state, year, id, query.direction).await?,
    ))
}

/// GET /db/{year}/external-buses/{id}/directions?direction=from_hanover
pub async fn external_directions(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((year, id)): Path<(i32, Uuid)>,
    Query(query): Query<DirectionQuery>,
) -> Result<Json<DirectionsView>, AppError> {
    ctx.require(Permission::ViewDb)?;
    let schedule = external_schedule(&state, year, id, query.direction).await?;
    Ok(Json(directions_for(&state, schedule).await?))
}
