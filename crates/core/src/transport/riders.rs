//! Internal transport matrices: which buses run, and how many people ride them.

use std::collections::{BTreeSet, HashMap};
use std::ops::{Add, AddAssign};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matrix::{Blank, OrderedMatrix};
use crate::trips::{EffectiveRoutes, Section, Trip, TripDates, TripTemplate};

use super::{Route, ScheduledTransport, Stop, Vehicle};

/// Number of people on a route leg, split by what the bus is doing for them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Riders {
    pub dropping_off: u32,
    pub picking_up: u32,
    pub returning: u32,
}

impl Riders {
    pub fn new(dropping_off: u32, picking_up: u32, returning: u32) -> Self {
        Self {
            dropping_off,
            picking_up,
            returning,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dropping_off == 0 && self.picking_up == 0 && self.returning == 0
    }

    fn exceeds(&self, capacity: u32) -> bool {
        self.dropping_off > capacity || self.picking_up > capacity || self.returning > capacity
    }
}

impl Add for Riders {
    type Output = Riders;

    fn add(self, other: Riders) -> Riders {
        Riders {
            dropping_off: self.dropping_off + other.dropping_off,
            picking_up: self.picking_up + other.picking_up,
            returning: self.returning + other.returning,
        }
    }
}

impl AddAssign for Riders {
    fn add_assign(&mut self, other: Riders) {
        *self = *self + other;
    }
}

impl Blank for Riders {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl std::fmt::Display for Riders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Dropping off {}, picking up {}, returning {} to campus",
            self.dropping_off, self.picking_up, self.returning
        )
    }
}

/// A trip with everything the transport views need resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportedTrip {
    pub id: Uuid,
    pub label: String,
    pub dates: TripDates,
    pub routes: EffectiveRoutes,
    pub dropoff_stop: Uuid,
    pub pickup_stop: Uuid,
    /// `max_trippees` plus two leaders.
    pub max_num_people: u32,
    /// Assigned trippees plus assigned leaders.
    pub size: u32,
}

impl TransportedTrip {
    pub fn new(
        trip: &Trip,
        section: &Section,
        template: &TripTemplate,
        stops: &HashMap<Uuid, Stop>,
        size: u32,
    ) -> Self {
        Self {
            id: trip.id,
            label: crate::trips::trip_label(section, template),
            dates: TripDates::for_section(section),
            routes: EffectiveRoutes::resolve(
                trip,
                template,
                stops.get(&template.dropoff_stop),
                stops.get(&template.pickup_stop),
            ),
            dropoff_stop: template.dropoff_stop,
            pickup_stop: template.pickup_stop,
            max_num_people: template.max_num_people(),
            size,
        }
    }
}

/// Problems flagged on the internal transport grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportIssue {
    NotScheduled,
    ExceedsCapacity,
}

pub type RouteMatrix = OrderedMatrix<Uuid, NaiveDate, Option<ScheduledTransport>>;
pub type RiderMatrix = OrderedMatrix<Uuid, NaiveDate, Riders>;
pub type IssueMatrix = OrderedMatrix<Uuid, NaiveDate, Option<TransportIssue>>;

/// Every trip date across all sections, sorted and deduplicated.
pub fn all_trip_dates(sections: &[Section]) -> Vec<NaiveDate> {
    sections
        .iter()
        .flat_map(Section::trip_dates)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn internal_route_ids(routes: &[Route]) -> Vec<Uuid> {
    routes
        .iter()
        .filter(|r| r.is_internal())
        .map(|r| r.id)
        .collect()
}

/// Internal routes by trip date, with the scheduled bus in each cell.
pub fn internal_route_matrix(
    routes: &[Route],
    sections: &[Section],
    transports: &[ScheduledTransport],
) -> RouteMatrix {
    let mut matrix = OrderedMatrix::new(internal_route_ids(routes), all_trip_dates(sections), || None);
    for transport in transports {
        matrix.set(&transport.route, &transport.date, Some(transport.clone()));
    }
    matrix
}

fn rider_matrix(
    routes: &[Route],
    sections: &[Section],
    trips: &[TransportedTrip],
    size: impl Fn(&TransportedTrip) -> u32,
) -> RiderMatrix {
    let mut matrix = OrderedMatrix::new(
        internal_route_ids(routes),
        all_trip_dates(sections),
        Riders::default,
    );

    for trip in trips {
        let n = size(trip);
        let legs = [
            (trip.routes.dropoff, trip.dates.dropoff, Riders::new(n, 0, 0)),
            (trip.routes.pickup, trip.dates.pickup, Riders::new(0, n, 0)),
            (
                trip.routes.return_route,
                trip.dates.return_to_campus,
                Riders::new(0, 0, n),
            ),
        ];
        for (route, date, riders) in legs {
            let Some(route) = route else { continue };
            if let Some(cell) = matrix.get_mut(&route, &date) {
                *cell += riders;
            }
        }
    }

    matrix
}

/// Hypothetical riders, assuming every trip is full.
pub fn internal_rider_matrix(
    routes: &[Route],
    sections: &[Section],
    trips: &[TransportedTrip],
) -> RiderMatrix {
    rider_matrix(routes, sections, trips, |t| t.max_num_people)
}

/// Riders based on actual trip assignments.
pub fn actual_rider_matrix(
    routes: &[Route],
    sections: &[Section],
    trips: &[TransportedTrip],
) -> RiderMatrix {
    rider_matrix(routes, sections, trips, |t| t.size)
}

/// Capacity of the vehicle serving each route.
pub fn route_capacities(routes: &[Route], vehicles: &[Vehicle]) -> HashMap<Uuid, u32> {
    let vehicles: HashMap<Uuid, u32> = vehicles.iter().map(|v| (v.id, v.capacity)).collect();
    routes
        .iter()
        .filter_map(|r| vehicles.get(&r.vehicle).map(|c| (r.id, *c)))
        .collect()
}

/// Flags cells with riders but no bus, and buses too small for their riders.
pub fn issues_matrix(
    transports: &RouteMatrix,
    riders: &RiderMatrix,
    capacities: &HashMap<Uuid, u32>,
) -> IssueMatrix {
    let mut issues = riders.map(|_| None);

    for (route, cells) in riders.iter_rows() {
        let capacity = capacities.get(route).copied().unwrap_or(0);
        for (date, count) in riders.cols().iter().zip(cells) {
            if count.is_empty() {
                continue;
            }
            let scheduled = matches!(transports.get(route, date), Some(Some(_)));
            let issue = if !scheduled {
                Some(TransportIssue::NotScheduled)
            } else if count.exceeds(capacity) {
                Some(TransportIssue::ExceedsCapacity)
            } else {
                None
            };
            issues.set(route, date, issue);
        }
    }

    issues
}

/// Number of trips dropped off, picked up and returned per route and date.
#[derive(Debug, Clone, Serialize)]
pub struct LegCounts {
    pub dropoffs: OrderedMatrix<Uuid, NaiveDate, u32>,
    pub pickups: OrderedMatrix<Uuid, NaiveDate, u32>,
    pub returns: OrderedMatrix<Uuid, NaiveDate, u32>,
}

/// Trip counts per leg, with empty routes dropped.
pub fn leg_counts(routes: &[Route], sections: &[Section], trips: &[TransportedTrip]) -> LegCounts {
    let counts = rider_matrix(routes, sections, trips, |_| 1);
    LegCounts {
        dropoffs: counts.map(|r| r.dropping_off).truncate(),
        pickups: counts.map(|r| r.picking_up).truncate(),
        returns: counts.map(|r| r.returning).truncate(),
    }
}
