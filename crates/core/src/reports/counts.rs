use std::collections::BTreeMap;

use serde::Serialize;

use crate::applications::{ApplicationStatus, GeneralApplication, TshirtSize};
use crate::incoming::{IncomingStatus, IncomingStudent, Registration};

/// Number of shirts per size, every size present.
pub type TshirtCounts = BTreeMap<TshirtSize, usize>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tshirts {
    pub leaders: TshirtCounts,
    pub croos: TshirtCounts,
    pub trippees: TshirtCounts,
}

fn count_sizes(sizes: impl Iterator<Item = TshirtSize>) -> TshirtCounts {
    let mut counts: TshirtCounts = TshirtSize::ALL.into_iter().map(|s| (s, 0)).collect();
    for size in sizes {
        *counts.entry(size).or_default() += 1;
    }
    counts
}

pub fn tshirt_counts(applications: &[GeneralApplication], registrations: &[Registration]) -> Tshirts {
    let with_status = |status: ApplicationStatus| {
        count_sizes(
            applications
                .iter()
                .filter(move |a| a.status == status)
                .map(|a| a.tshirt_size),
        )
    };
    Tshirts {
        leaders: with_status(ApplicationStatus::Leader),
        croos: with_status(ApplicationStatus::Croo),
        trippees: count_sizes(registrations.iter().map(|r| r.tshirt_size)),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub firstyear: usize,
    pub transfer: usize,
    pub exchange: usize,
    pub unlabeled: usize,
    pub total: usize,
}

impl<'a> FromIterator<&'a IncomingStudent> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = &'a IncomingStudent>>(iter: I) -> Self {
        let mut counts = StatusCounts::default();
        for student in iter {
            match student.incoming_status {
                Some(IncomingStatus::FirstYear) => counts.firstyear += 1,
                Some(IncomingStatus::Transfer) => counts.transfer += 1,
                Some(IncomingStatus::Exchange) => counts.exchange += 1,
                None => counts.unlabeled += 1,
            }
            counts.total += 1;
        }
        counts
    }
}

/// Trippees with a trip and cancelled trippees, by incoming status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub with_trip: StatusCounts,
    pub cancelled: StatusCounts,
}

pub fn statistics(students: &[IncomingStudent]) -> Statistics {
    Statistics {
        with_trip: students.iter().filter(|s| s.trip_assignment.is_some()).collect(),
        cancelled: students.iter().filter(|s| s.cancelled).collect(),
    }
}
