//! What each incoming student owes, in cents.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::transport::Stop;

use super::{IncomingSettings, IncomingStudent, Registration};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Charges {
    pub trip: u32,
    pub cancellation: u32,
    pub bus: u32,
    pub doc_membership: u32,
    pub green_fund: u32,
    pub total: u32,
}

/// Reduces `cents` by the student's financial aid percentage.
pub fn adjust(cents: u32, financial_aid: u8) -> u32 {
    let aid = u64::from(financial_aid.min(100));
    (u64::from(cents) * (100 - aid) / 100) as u32
}

pub fn bus_cost(student: &IncomingStudent, stops: &HashMap<Uuid, Stop>) -> u32 {
    let one_way = |stop: Option<Uuid>| {
        stop.and_then(|id| stops.get(&id))
            .and_then(|s| s.cost_one_way)
            .unwrap_or(0)
    };
    let cost = match student.bus_assignment_round_trip {
        Some(id) => stops.get(&id).and_then(|s| s.cost_round_trip).unwrap_or(0),
        None => {
            one_way(student.bus_assignment_to_hanover) + one_way(student.bus_assignment_from_hanover)
        }
    };
    adjust(cost, student.financial_aid)
}

/// Every charge for `student`. `registration` is the student's linked
/// registration, if any.
pub fn compute_charges(
    student: &IncomingStudent,
    registration: Option<&Registration>,
    settings: &IncomingSettings,
    stops: &HashMap<Uuid, Stop>,
) -> Charges {
    let aid = student.financial_aid;
    let trip = if student.trip_assignment.is_some() {
        adjust(settings.trips_cost, aid)
    } else {
        0
    };
    let cancellation = if student.cancelled {
        student
            .cancelled_fee
            .unwrap_or_else(|| adjust(settings.trips_cost, aid))
    } else {
        0
    };
    let bus = bus_cost(student, stops);
    let doc_membership = match registration {
        Some(r) if r.doc_membership.is_yes() => adjust(settings.doc_membership_cost, aid),
        _ => 0,
    };
    let green_fund = registration.map(|r| r.green_fund_donation).unwrap_or(0);

    Charges {
        trip,
        cancellation,
        bus,
        doc_membership,
        green_fund,
        total: trip + cancellation + bus + doc_membership + green_fund,
    }
}
