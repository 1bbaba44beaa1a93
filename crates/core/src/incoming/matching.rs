//! Matching registrations to registrar data, and to trips.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::transport::ExternalRider;
use crate::trips::{Trip, TripTemplate};

use super::{IncomingStudent, Registration};

/// The student a new registration belongs to, by netid and year.
pub fn student_for_registration<'a>(
    registration: &Registration,
    students: &'a [IncomingStudent],
) -> Option<&'a IncomingStudent> {
    students.iter().find(|s| {
        s.trips_year == registration.trips_year && s.netid.eq_ignore_ascii_case(&registration.netid)
    })
}

/// The registration a new student should be linked to, by netid and year.
pub fn registration_for_student<'a>(
    student: &IncomingStudent,
    registrations: &'a [Registration],
) -> Option<&'a Registration> {
    registrations.iter().find(|r| {
        r.trips_year == student.trips_year && r.netid.eq_ignore_ascii_case(&student.netid)
    })
}

pub fn unregistered(students: &[IncomingStudent], trips_year: i32) -> Vec<&IncomingStudent> {
    students
        .iter()
        .filter(|s| s.trips_year == trips_year && s.registration.is_none())
        .collect()
}

/// Registrations with no incoming student pointing at them.
pub fn unmatched<'a>(
    registrations: &'a [Registration],
    students: &[IncomingStudent],
    trips_year: i32,
) -> Vec<&'a Registration> {
    registrations
        .iter()
        .filter(|r| r.trips_year == trips_year)
        .filter(|r| !students.iter().any(|s| s.registration == Some(r.id)))
        .collect()
}

fn section_ok(registration: &Registration, section: Uuid) -> bool {
    registration.preferred_sections.contains(&section)
        || registration.available_sections.contains(&section)
}

fn swimming_ok(registration: &Registration, template: &TripTemplate) -> bool {
    template.non_swimmers_allowed || !registration.is_non_swimmer()
}

/// Registrations whose preferences allow them on `trip`.
pub fn available_for_trip<'a>(
    trip: &Trip,
    template: &TripTemplate,
    registrations: &'a [Registration],
) -> Vec<&'a Registration> {
    let triptype = template.triptype;
    registrations
        .iter()
        .filter(|r| r.trips_year == trip.trips_year)
        .filter(|r| section_ok(r, trip.section))
        .filter(|r| {
            r.firstchoice_triptype == Some(triptype)
                || r.preferred_triptypes.contains(&triptype)
                || r.available_triptypes.contains(&triptype)
        })
        .filter(|r| swimming_ok(r, template))
        .collect()
}

pub fn want_financial_aid(registrations: &[Registration], trips_year: i32) -> Vec<&Registration> {
    registrations
        .iter()
        .filter(|r| r.trips_year == trips_year && r.financial_assistance.is_yes())
        .collect()
}

pub fn want_bus(registrations: &[Registration], trips_year: i32) -> Vec<&Registration> {
    registrations
        .iter()
        .filter(|r| r.trips_year == trips_year && r.wants_bus())
        .collect()
}

/// Trips a registrant could go on, grouped by how much they want them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TripChoices {
    pub first_choice: Vec<Uuid>,
    pub preferred: Vec<Uuid>,
    pub available: Vec<Uuid>,
}

pub fn trip_choices(
    registration: &Registration,
    trips: &[Trip],
    templates: &[TripTemplate],
) -> TripChoices {
    let templates: HashMap<Uuid, &TripTemplate> = templates.iter().map(|t| (t.id, t)).collect();
    let mut choices = TripChoices::default();

    for trip in trips.iter().filter(|t| t.trips_year == registration.trips_year) {
        let Some(template) = templates.get(&trip.template) else {
            continue;
        };
        if !section_ok(registration, trip.section) || !swimming_ok(registration, template) {
            continue;
        }
        let triptype = template.triptype;
        if registration.firstchoice_triptype == Some(triptype) {
            choices.first_choice.push(trip.id);
        }
        if registration.preferred_triptypes.contains(&triptype) {
            choices.preferred.push(trip.id);
        }
        if registration.available_triptypes.contains(&triptype) {
            choices.available.push(trip.id);
        }
    }
    choices
}

/// External bus riders among students with a trip. The section comes from
/// the trip assignment.
pub fn external_riders(students: &[IncomingStudent], trips: &[Trip]) -> Vec<ExternalRider> {
    let sections: HashMap<Uuid, Uuid> = trips.iter().map(|t| (t.id, t.section)).collect();
    students
        .iter()
        .filter_map(|s| {
            let section = *sections.get(&s.trip_assignment?)?;
            Some(ExternalRider {
                student: s.id,
                section,
                round_trip: s.bus_assignment_round_trip,
                to_hanover: s.bus_assignment_to_hanover,
                from_hanover: s.bus_assignment_from_hanover,
            })
        })
        .filter(|r| r.round_trip.is_some() || r.to_hanover.is_some() || r.from_hanover.is_some())
        .collect()
}
