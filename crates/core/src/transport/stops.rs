//! Stop-by-stop schedules for a single bus, with the running passenger load.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use super::{ScheduledTransport, Stop, TransportedTrip};

/// Someone (a trip or a single passenger) getting on or off at a stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Boarding {
    pub id: Uuid,
    pub label: String,
    pub size: u32,
}

impl Boarding {
    fn trip(trip: &TransportedTrip) -> Self {
        Self {
            id: trip.id,
            label: trip.label.clone(),
            size: trip.size,
        }
    }
}

/// One stop a bus makes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusStop {
    pub stop: Stop,
    pub picked_up: Vec<Boarding>,
    pub dropped_off: Vec<Boarding>,
    /// People on the bus when it leaves this stop.
    pub passenger_count: u32,
    pub over_capacity: bool,
}

impl BusStop {
    fn new(stop: Stop) -> Self {
        Self {
            stop,
            picked_up: Vec::new(),
            dropped_off: Vec::new(),
            passenger_count: 0,
            over_capacity: false,
        }
    }
}

/// The ordered stops of one bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusSchedule {
    pub capacity: u32,
    pub stops: Vec<BusStop>,
}

impl BusSchedule {
    fn new(capacity: u32, mut stops: Vec<BusStop>) -> Self {
        let mut load: u32 = 0;
        for stop in stops.iter_mut() {
            load += stop.picked_up.iter().map(|b| b.size).sum::<u32>();
            load = load.saturating_sub(stop.dropped_off.iter().map(|b| b.size).sum());
            stop.passenger_count = load;
            stop.over_capacity = load > capacity;
        }
        Self { capacity, stops }
    }

    /// True if the bus is too full at some point on its route.
    pub fn over_capacity(&self) -> bool {
        self.stops.iter().any(|s| s.over_capacity)
    }

    pub fn locations(&self) -> Vec<&Stop> {
        self.stops.iter().map(|s| &s.stop).collect()
    }
}

/// The trips an internal bus serves on its date.
#[derive(Debug, Clone, Default)]
pub struct BusLoad<'a> {
    pub dropping_off: Vec<&'a TransportedTrip>,
    pub picking_up: Vec<&'a TransportedTrip>,
    pub returning: Vec<&'a TransportedTrip>,
}

impl<'a> BusLoad<'a> {
    pub fn for_transport(transport: &ScheduledTransport, trips: &'a [TransportedTrip]) -> Self {
        let on = |route: Option<Uuid>, date| route == Some(transport.route) && date == transport.date;
        Self {
            dropping_off: trips
                .iter()
                .filter(|t| on(t.routes.dropoff, t.dates.dropoff))
                .collect(),
            picking_up: trips
                .iter()
                .filter(|t| on(t.routes.pickup, t.dates.pickup))
                .collect(),
            returning: trips
                .iter()
                .filter(|t| on(t.routes.return_route, t.dates.return_to_campus))
                .collect(),
        }
    }
}

/// Stops made by an internal bus.
///
/// The bus starts in Hanover, loading every trip it drops off. Trailheads
/// follow in order of distance from Hanover. The Lodge is visited only if
/// a trip is picked up or returning, and the bus goes back to Hanover only
/// if a trip is returning.
pub fn internal_bus_stops(
    load: &BusLoad<'_>,
    stops: &HashMap<Uuid, Stop>,
    hanover: &Stop,
    lodge: &Stop,
    capacity: u32,
) -> BusSchedule {
    let boardings = |trips: &[&TransportedTrip]| -> Vec<Boarding> {
        trips.iter().map(|t| Boarding::trip(t)).collect()
    };

    let mut start = BusStop::new(hanover.clone());
    start.picked_up = boardings(&load.dropping_off);
    let mut schedule = vec![start];

    // (stop, is_dropoff, trip)
    let mut visits: Vec<(&Stop, bool, &TransportedTrip)> = load
        .dropping_off
        .iter()
        .filter_map(|t| stops.get(&t.dropoff_stop).map(|s| (s, true, *t)))
        .chain(
            load.picking_up
                .iter()
                .filter_map(|t| stops.get(&t.pickup_stop).map(|s| (s, false, *t))),
        )
        .collect();
    visits.sort_by_key(|(stop, _, _)| stop.distance);

    for (stop, is_dropoff, trip) in visits {
        let same_stop = schedule.len() > 1 && schedule.last().map(|s| s.stop.id) == Some(stop.id);
        if !same_stop {
            schedule.push(BusStop::new(stop.clone()));
        }
        if let Some(current) = schedule.last_mut() {
            if is_dropoff {
                current.dropped_off.push(Boarding::trip(trip));
            } else {
                current.picked_up.push(Boarding::trip(trip));
            }
        }
    }

    if !load.picking_up.is_empty() || !load.returning.is_empty() {
        let mut stop = BusStop::new(lodge.clone());
        stop.dropped_off = boardings(&load.picking_up);
        stop.picked_up = boardings(&load.returning);
        schedule.push(stop);
    }

    if !load.returning.is_empty() {
        let mut stop = BusStop::new(hanover.clone());
        stop.dropped_off = boardings(&load.returning);
        schedule.push(stop);
    }

    BusSchedule::new(capacity, schedule)
}

/// A local student riding an external bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passenger {
    pub id: Uuid,
    pub name: String,
    /// Where the student gets on (to Hanover) or off (from Hanover).
    pub stop: Uuid,
}

fn group_passengers<'a>(
    passengers: &[Passenger],
    stops: &'a HashMap<Uuid, Stop>,
) -> Vec<(&'a Stop, Vec<Boarding>)> {
    let mut grouped: HashMap<Uuid, Vec<Boarding>> = HashMap::new();
    for passenger in passengers {
        grouped.entry(passenger.stop).or_default().push(Boarding {
            id: passenger.id,
            label: passenger.name.clone(),
            size: 1,
        });
    }
    let mut grouped: Vec<(&Stop, Vec<Boarding>)> = grouped
        .into_iter()
        .filter_map(|(id, boardings)| stops.get(&id).map(|s| (s, boardings)))
        .collect();
    grouped.sort_by_key(|(stop, _)| stop.distance);
    grouped
}

fn all_boardings(passengers: &[Passenger]) -> Vec<Boarding> {
    passengers
        .iter()
        .map(|p| Boarding {
            id: p.id,
            label: p.name.clone(),
            size: 1,
        })
        .collect()
}

/// Stops an external bus makes on its way in to Hanover, farthest first.
pub fn external_stops_to_hanover(
    passengers: &[Passenger],
    stops: &HashMap<Uuid, Stop>,
    hanover: &Stop,
    capacity: u32,
) -> BusSchedule {
    let mut schedule: Vec<BusStop> = group_passengers(passengers, stops)
        .into_iter()
        .rev()
        .map(|(stop, boardings)| {
            let mut bus_stop = BusStop::new(stop.clone());
            bus_stop.picked_up = boardings;
            bus_stop
        })
        .collect();

    let mut end = BusStop::new(hanover.clone());
    end.dropped_off = all_boardings(passengers);
    schedule.push(end);

    BusSchedule::new(capacity, schedule)
}

/// Stops an external bus makes taking students home, nearest first.
pub fn external_stops_from_hanover(
    passengers: &[Passenger],
    stops: &HashMap<Uuid, Stop>,
    hanover: &Stop,
    capacity: u32,
) -> BusSchedule {
    let mut start = BusStop::new(hanover.clone());
    start.picked_up = all_boardings(passengers);

    let schedule = std::iter::once(start)
        .chain(
            group_passengers(passengers, stops)
                .into_iter()
                .map(|(stop, boardings)| {
                    let mut bus_stop = BusStop::new(stop.clone());
                    bus_stop.dropped_off = boardings;
                    bus_stop
                }),
        )
        .collect();

    BusSchedule::new(capacity, schedule)
}
