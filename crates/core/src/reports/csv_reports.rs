//! Downloadable CSV reports for one trips year.

use std::collections::HashMap;

use uuid::Uuid;

use crate::applications::{ApplicationStatus, GeneralApplication};
use crate::incoming::{compute_charges, IncomingSettings, IncomingStudent, Registration};
use crate::transport::Stop;
use crate::trips::{trip_label, Section, Trip, TripTemplate};

use super::table::{dollars, dollars_or_blank, yes_blank, yes_no};
use super::{CsvTable, ReportError};

/// Everything the reports read for one year.
#[derive(Debug, Clone, Copy)]
pub struct YearData<'a> {
    pub trips_year: i32,
    pub applications: &'a [GeneralApplication],
    pub students: &'a [IncomingStudent],
    pub registrations: &'a [Registration],
    pub trips: &'a [Trip],
    pub sections: &'a [Section],
    pub templates: &'a [TripTemplate],
    pub stops: &'a [Stop],
    pub settings: Option<&'a IncomingSettings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Volunteers,
    Leaders,
    CrooMembers,
    Trippees,
    Charges,
    Housing,
    DietaryRestrictions,
    MedicalInfo,
    VolunteerDietaryRestrictions,
    FinancialAid,
    DocMembers,
    ExternalBus,
}

impl ReportKind {
    pub const ALL: [ReportKind; 12] = [
        ReportKind::Volunteers,
        ReportKind::Leaders,
        ReportKind::CrooMembers,
        ReportKind::Trippees,
        ReportKind::Charges,
        ReportKind::Housing,
        ReportKind::DietaryRestrictions,
        ReportKind::MedicalInfo,
        ReportKind::VolunteerDietaryRestrictions,
        ReportKind::FinancialAid,
        ReportKind::DocMembers,
        ReportKind::ExternalBus,
    ];

    /// Path segment, e.g. `charges.csv`.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Volunteers => "volunteers.csv",
            Self::Leaders => "leaders.csv",
            Self::CrooMembers => "croo-members.csv",
            Self::Trippees => "trippees.csv",
            Self::Charges => "charges.csv",
            Self::Housing => "housing.csv",
            Self::DietaryRestrictions => "dietary-restrictions.csv",
            Self::MedicalInfo => "medical-info.csv",
            Self::VolunteerDietaryRestrictions => "volunteer-dietary-restrictions.csv",
            Self::FinancialAid => "financial-aid.csv",
            Self::DocMembers => "doc-members.csv",
            Self::ExternalBus => "external-bus.csv",
        }
    }

    pub fn from_path(path: &str) -> Result<Self, ReportError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.path() == path)
            .ok_or_else(|| ReportError::UnknownReport(path.to_string()))
    }

    pub fn file_prefix(&self) -> &'static str {
        match self {
            Self::Volunteers => "TL-and-Croo-applicants",
            Self::Leaders => "Leaders",
            Self::CrooMembers => "Croo-Members",
            Self::Trippees => "Trippees",
            Self::Charges => "Charges",
            Self::Housing => "Housing",
            Self::DietaryRestrictions => "Dietary-Restrictions",
            Self::MedicalInfo => "Medical-Info",
            Self::VolunteerDietaryRestrictions => "Volunteer-Dietary-Restrictions",
            Self::FinancialAid => "Financial-aid",
            Self::DocMembers => "DOC-Members",
            Self::ExternalBus => "External-Bus-Requests",
        }
    }

    pub fn filename(&self, trips_year: i32) -> String {
        format!("{}-{}.csv", self.file_prefix(), trips_year)
    }

    pub fn build(&self, data: &YearData<'_>) -> Result<CsvTable, ReportError> {
        let lookup = Lookup::new(data);
        let table = match self {
            Self::Volunteers => volunteers(data),
            Self::Leaders => volunteers_with_status(data, ApplicationStatus::Leader),
            Self::CrooMembers => volunteers_with_status(data, ApplicationStatus::Croo),
            Self::Trippees => trippees(data),
            Self::Charges => charges(data)?,
            Self::Housing => housing(data, &lookup),
            Self::DietaryRestrictions => dietary_restrictions(data, &lookup),
            Self::MedicalInfo => medical_info(data, &lookup),
            Self::VolunteerDietaryRestrictions => volunteer_dietary_restrictions(data, &lookup),
            Self::FinancialAid => financial_aid(data, &lookup),
            Self::DocMembers => doc_members(data, &lookup),
            Self::ExternalBus => external_bus(data, &lookup),
        };
        Ok(table)
    }
}

/// Id lookups shared by the reports.
struct Lookup<'a> {
    trips: HashMap<Uuid, (&'a Trip, &'a Section, &'a TripTemplate)>,
    registrations: HashMap<Uuid, &'a Registration>,
    /// Incoming students by the registration they are linked to.
    students_by_registration: HashMap<Uuid, &'a IncomingStudent>,
    stops: HashMap<Uuid, &'a Stop>,
}

impl<'a> Lookup<'a> {
    fn new(data: &YearData<'a>) -> Self {
        let sections: HashMap<Uuid, &Section> = data.sections.iter().map(|s| (s.id, s)).collect();
        let templates: HashMap<Uuid, &TripTemplate> =
            data.templates.iter().map(|t| (t.id, t)).collect();
        let trips = data
            .trips
            .iter()
            .filter_map(|trip| {
                let section = *sections.get(&trip.section)?;
                let template = *templates.get(&trip.template)?;
                Some((trip.id, (trip, section, template)))
            })
            .collect();

        Self {
            trips,
            registrations: data.registrations.iter().map(|r| (r.id, r)).collect(),
            students_by_registration: data
                .students
                .iter()
                .filter_map(|s| Some((s.registration?, s)))
                .collect(),
            stops: data.stops.iter().map(|s| (s.id, s)).collect(),
        }
    }

    fn trip_label(&self, trip: Option<Uuid>) -> String {
        trip.and_then(|id| self.trips.get(&id))
            .map(|(_, section, template)| trip_label(section, template))
            .unwrap_or_default()
    }

    fn section_name(&self, trip: Option<Uuid>) -> String {
        trip.and_then(|id| self.trips.get(&id))
            .map(|(_, section, _)| section.name.clone())
            .unwrap_or_default()
    }

    fn trip_of_registration(&self, registration: &Registration) -> Option<Uuid> {
        self.students_by_registration
            .get(&registration.id)
            .and_then(|s| s.trip_assignment)
    }

    /// Registrar name if the registration is matched, else the name given.
    fn official_name(&self, registration: &Registration) -> String {
        self.students_by_registration
            .get(&registration.id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| registration.name.clone())
    }

    fn stop_name(&self, stop: Option<Uuid>) -> String {
        stop.and_then(|id| self.stops.get(&id))
            .map(|s| s.name.clone())
            .unwrap_or_default()
    }
}

fn epipen(value: Option<crate::applications::YesNo>) -> String {
    match value {
        Some(v) if v.is_yes() => "Yes".to_string(),
        Some(_) => "No".to_string(),
        None => String::new(),
    }
}

fn volunteers(data: &YearData<'_>) -> CsvTable {
    let mut table = CsvTable::new(vec![
        "name",
        "netid",
        "leader app",
        "croo app",
        "class year",
        "gender",
        "race/ethnicity",
        "hometown",
    ]);
    for app in data.applications {
        let leader = app.leader_application_complete();
        let croo = app.croo_application_complete();
        if !leader && !croo {
            continue;
        }
        table.push(vec![
            app.name.clone(),
            app.netid.clone(),
            yes_no(leader),
            yes_no(croo),
            app.class_year.to_string(),
            app.gender.clone(),
            app.race_ethnicity.clone(),
            app.from_where.clone(),
        ]);
    }
    table
}

fn volunteers_with_status(data: &YearData<'_>, status: ApplicationStatus) -> CsvTable {
    let mut table = CsvTable::new(vec!["name", "netid"]);
    for app in data.applications.iter().filter(|a| a.status == status) {
        table.push(vec![app.name.clone(), app.netid.to_uppercase()]);
    }
    table
}

fn trippees(data: &YearData<'_>) -> CsvTable {
    let mut table = CsvTable::new(vec!["name", "netid"]);
    for student in data.students.iter().filter(|s| s.trip_assignment.is_some()) {
        table.push(vec![student.name.clone(), student.netid.to_uppercase()]);
    }
    table
}

fn charges(data: &YearData<'_>) -> Result<CsvTable, ReportError> {
    let settings = data
        .settings
        .ok_or(ReportError::MissingSettings(data.trips_year))?;
    let stops: HashMap<Uuid, Stop> = data.stops.iter().map(|s| (s.id, s.clone())).collect();
    let registrations: HashMap<Uuid, &Registration> =
        data.registrations.iter().map(|r| (r.id, r)).collect();

    let mut table = CsvTable::new(vec![
        "name",
        "netid",
        "total charge",
        "aid award (percentage)",
        "trip",
        "bus",
        "doc membership",
        "green fund",
        "cancellation",
    ]);
    for student in data.students {
        let registration = student
            .registration
            .and_then(|id| registrations.get(&id))
            .copied();
        let on_report = student.trip_assignment.is_some()
            || student.cancelled
            || registration.is_some_and(|r| r.doc_membership.is_yes() || r.green_fund_donation > 0);
        if !on_report {
            continue;
        }

        let charges = compute_charges(student, registration, settings, &stops);
        table.push(vec![
            student.name.clone(),
            student.netid.clone(),
            dollars(charges.total),
            if student.financial_aid == 0 {
                String::new()
            } else {
                student.financial_aid.to_string()
            },
            dollars_or_blank(charges.trip),
            dollars_or_blank(charges.bus),
            dollars_or_blank(charges.doc_membership),
            dollars_or_blank(charges.green_fund),
            dollars_or_blank(charges.cancellation),
        ]);
    }
    Ok(table)
}

fn housing(data: &YearData<'_>, lookup: &Lookup<'_>) -> CsvTable {
    const FMT: &str = "%m/%d";
    let mut table = CsvTable::new(vec![
        "name",
        "netid",
        "trip",
        "section",
        "start date",
        "end date",
        "native",
        "fysep",
        "international",
    ]);
    for student in data.students {
        let registration = student
            .registration
            .and_then(|id| lookup.registrations.get(&id))
            .copied();
        let assigned = student.trip_assignment.and_then(|id| lookup.trips.get(&id));
        let (trip, section, start, end) = match assigned {
            Some((_, section, template)) => (
                trip_label(section, template),
                section.name.clone(),
                section.trippees_arrive().format(FMT).to_string(),
                section.return_to_campus().format(FMT).to_string(),
            ),
            None => Default::default(),
        };
        table.push(vec![
            student.name.clone(),
            student.netid.clone(),
            trip,
            section,
            start,
            end,
            yes_blank(registration.is_some_and(|r| r.native())),
            yes_blank(registration.is_some_and(|r| r.fysep())),
            yes_blank(registration.is_some_and(|r| r.international())),
        ]);
    }
    table
}

fn dietary_restrictions(data: &YearData<'_>, lookup: &Lookup<'_>) -> CsvTable {
    let mut table = CsvTable::new(vec![
        "name",
        "netid",
        "section",
        "trip",
        "food allergies",
        "dietary restrictions",
        "epipen",
    ]);
    for reg in data.registrations {
        let trip = lookup.trip_of_registration(reg);
        table.push(vec![
            reg.name.clone(),
            reg.netid.clone(),
            lookup.section_name(trip),
            lookup.trip_label(trip),
            reg.food_allergies.clone(),
            reg.dietary_restrictions.clone(),
            epipen(reg.epipen),
        ]);
    }
    table
}

fn medical_info(data: &YearData<'_>, lookup: &Lookup<'_>) -> CsvTable {
    let mut table = CsvTable::new(vec![
        "name",
        "netid",
        "section",
        "trip",
        "medical conditions",
        "food allergies",
        "dietary restrictions",
        "epipen",
        "needs",
    ]);
    for reg in data.registrations {
        let trip = lookup.trip_of_registration(reg);
        table.push(vec![
            reg.name.clone(),
            reg.netid.clone(),
            lookup.section_name(trip),
            lookup.trip_label(trip),
            reg.medical_conditions.clone(),
            reg.food_allergies.clone(),
            reg.dietary_restrictions.clone(),
            epipen(reg.epipen),
            reg.needs.clone(),
        ]);
    }
    table
}

fn volunteer_dietary_restrictions(data: &YearData<'_>, lookup: &Lookup<'_>) -> CsvTable {
    let mut table = CsvTable::new(vec![
        "name",
        "netid",
        "role",
        "trip",
        "dietary restrictions",
        "allergen information",
    ]);
    let mut volunteers: Vec<&GeneralApplication> = data
        .applications
        .iter()
        .filter(|a| matches!(a.status, ApplicationStatus::Leader | ApplicationStatus::Croo))
        .collect();
    volunteers.sort_by_key(|a| a.status != ApplicationStatus::Croo);

    for app in volunteers {
        let role = match app.status {
            ApplicationStatus::Croo => "CROO",
            _ => "LEADER",
        };
        table.push(vec![
            app.name.clone(),
            app.netid.clone(),
            role.to_string(),
            lookup.trip_label(app.leader_supplement.assigned_trip),
            app.dietary_restrictions.clone(),
            app.allergen_information.clone(),
        ]);
    }
    table
}

fn financial_aid(data: &YearData<'_>, lookup: &Lookup<'_>) -> CsvTable {
    let mut table = CsvTable::new(vec!["name", "preferred name", "netid", "email"]);
    for reg in crate::incoming::want_financial_aid(data.registrations, data.trips_year) {
        table.push(vec![
            lookup.official_name(reg),
            reg.name.clone(),
            reg.netid.clone(),
            reg.email.clone(),
        ]);
    }
    table
}

fn doc_members(data: &YearData<'_>, lookup: &Lookup<'_>) -> CsvTable {
    let mut table = CsvTable::new(vec!["name", "netid", "email"]);
    for reg in data.registrations.iter().filter(|r| r.doc_membership.is_yes()) {
        table.push(vec![lookup.official_name(reg), reg.netid.clone(), reg.email.clone()]);
    }
    table
}

fn external_bus(data: &YearData<'_>, lookup: &Lookup<'_>) -> CsvTable {
    let mut table = CsvTable::new(vec![
        "name",
        "preferred name",
        "netid",
        "requested bus round trip",
        "requested bus to hanover",
        "requested bus from hanover",
    ]);
    for reg in crate::incoming::want_bus(data.registrations, data.trips_year) {
        table.push(vec![
            lookup.official_name(reg),
            reg.name.clone(),
            reg.netid.clone(),
            lookup.stop_name(reg.bus_stop_round_trip),
            lookup.stop_name(reg.bus_stop_to_hanover),
            lookup.stop_name(reg.bus_stop_from_hanover),
        ]);
    }
    table
}
