//! External buses: local sections by external route.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matrix::OrderedMatrix;
use crate::trips::Section;

use super::{ExternalBus, Route, Stop};

pub type ExternalBusMatrix = OrderedMatrix<Uuid, Uuid, Option<ExternalBus>>;
pub type PassengerMatrix = OrderedMatrix<Uuid, Uuid, u32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    ToHanover,
    FromHanover,
}

/// The bus stops assigned to a student with a trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalRider {
    pub student: Uuid,
    pub section: Uuid,
    pub round_trip: Option<Uuid>,
    pub to_hanover: Option<Uuid>,
    pub from_hanover: Option<Uuid>,
}

impl ExternalRider {
    /// The stop used in `direction`; a round trip covers both.
    pub fn stop(&self, direction: Direction) -> Option<Uuid> {
        self.round_trip.or(match direction {
            Direction::ToHanover => self.to_hanover,
            Direction::FromHanover => self.from_hanover,
        })
    }
}

fn external_rows(routes: &[Route]) -> Vec<Uuid> {
    routes
        .iter()
        .filter(|r| !r.is_internal())
        .map(|r| r.id)
        .collect()
}

fn local_cols(sections: &[Section]) -> Vec<Uuid> {
    sections
        .iter()
        .filter(|s| s.is_local)
        .map(|s| s.id)
        .collect()
}

/// External routes by local section, with the scheduled bus in each cell.
pub fn external_bus_matrix(
    routes: &[Route],
    sections: &[Section],
    buses: &[ExternalBus],
) -> ExternalBusMatrix {
    let mut matrix = OrderedMatrix::new(external_rows(routes), local_cols(sections), || None);
    for bus in buses {
        matrix.set(&bus.route, &bus.section, Some(bus.clone()));
    }
    matrix
}

/// Number of students riding each external route, per section, in one direction.
pub fn passenger_matrix(
    routes: &[Route],
    sections: &[Section],
    riders: &[ExternalRider],
    stops: &HashMap<Uuid, Stop>,
    direction: Direction,
) -> PassengerMatrix {
    let mut matrix = OrderedMatrix::new(external_rows(routes), local_cols(sections), || 0);
    for rider in riders {
        let Some(route) = rider
            .stop(direction)
            .and_then(|stop| stops.get(&stop))
            .and_then(|stop| stop.route)
        else {
            continue;
        };
        if let Some(count) = matrix.get_mut(&route, &rider.section) {
            *count += 1;
        }
    }
    matrix
}

/// Riders of one external bus in one direction.
pub fn riders_on<'a>(
    bus: &ExternalBus,
    riders: &'a [ExternalRider],
    stops: &HashMap<Uuid, Stop>,
    direction: Direction,
) -> Vec<(&'a ExternalRider, Uuid)> {
    riders
        .iter()
        .filter(|r| r.section == bus.section)
        .filter_map(|r| {
            let stop = r.stop(direction)?;
            let on_route = stops.get(&stop)?.route == Some(bus.route);
            on_route.then_some((r, stop))
        })
        .collect()
}
