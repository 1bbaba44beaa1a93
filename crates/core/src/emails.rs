//! Mailing lists for applicants, leaders, incoming students and trippees.
//!
//! Volunteer addresses come from their user accounts, so callers pass a map
//! from user id to email. Applicants without an account address are left
//! out rather than listed blank.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::applications::{ApplicationStatus, GeneralApplication};
use crate::incoming::{unregistered, IncomingStudent, Registration};
use crate::trips::{Section, Trip, TripTemplate, TripType};

/// A named list of addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailList {
    pub name: String,
    pub emails: Vec<String>,
}

impl EmailList {
    fn new(name: impl Into<String>, emails: Vec<String>) -> Self {
        Self {
            name: name.into(),
            emails,
        }
    }
}

fn applicant_emails<'a>(
    applications: impl IntoIterator<Item = &'a GeneralApplication>,
    emails: &HashMap<Uuid, String>,
) -> Vec<String> {
    applications
        .into_iter()
        .filter_map(|a| emails.get(&a.applicant).cloned())
        .collect()
}

fn with_status(
    applications: &[GeneralApplication],
    status: ApplicationStatus,
) -> impl Iterator<Item = &GeneralApplication> {
    applications.iter().filter(move |a| a.status == status)
}

pub fn applicant_lists(
    applications: &[GeneralApplication],
    emails: &HashMap<Uuid, String>,
) -> Vec<EmailList> {
    let leader_complete = |a: &&GeneralApplication| a.leader_application_complete();
    let croo_complete = |a: &&GeneralApplication| a.croo_application_complete();
    vec![
        EmailList::new("all applicants", applicant_emails(applications, emails)),
        EmailList::new(
            "complete leader applications",
            applicant_emails(applications.iter().filter(leader_complete), emails),
        ),
        EmailList::new(
            "complete croo applications",
            applicant_emails(applications.iter().filter(croo_complete), emails),
        ),
        EmailList::new(
            "incomplete leader applications",
            applicant_emails(applications.iter().filter(|a| !leader_complete(a)), emails),
        ),
        EmailList::new(
            "incomplete croo applications",
            applicant_emails(applications.iter().filter(|a| !croo_complete(a)), emails),
        ),
        EmailList::new(
            "leaders",
            applicant_emails(with_status(applications, ApplicationStatus::Leader), emails),
        ),
        EmailList::new(
            "leader waitlist",
            applicant_emails(with_status(applications, ApplicationStatus::LeaderWaitlist), emails),
        ),
        EmailList::new(
            "croo members",
            applicant_emails(with_status(applications, ApplicationStatus::Croo), emails),
        ),
        EmailList::new(
            "rejected applicants",
            applicant_emails(with_status(applications, ApplicationStatus::Rejected), emails),
        ),
    ]
}

fn assigned_trip<'a>(application: &GeneralApplication, trips: &'a [Trip]) -> Option<&'a Trip> {
    let trip = application.leader_supplement.assigned_trip?;
    trips.iter().find(|t| t.id == trip)
}

/// One list per trip type of the leaders assigned to trips of that type.
pub fn leaders_by_triptype(
    applications: &[GeneralApplication],
    trips: &[Trip],
    templates: &[TripTemplate],
    triptypes: &[TripType],
    emails: &HashMap<Uuid, String>,
) -> Vec<EmailList> {
    let triptype_of: HashMap<Uuid, Uuid> = templates.iter().map(|t| (t.id, t.triptype)).collect();
    triptypes
        .iter()
        .map(|triptype| {
            let leaders = with_status(applications, ApplicationStatus::Leader).filter(|a| {
                assigned_trip(a, trips)
                    .and_then(|trip| triptype_of.get(&trip.template))
                    .is_some_and(|t| *t == triptype.id)
            });
            EmailList::new(format!("{} leaders", triptype.name), applicant_emails(leaders, emails))
        })
        .collect()
}

/// One list per section of the leaders assigned to trips in that section.
pub fn leaders_by_section(
    applications: &[GeneralApplication],
    trips: &[Trip],
    sections: &[Section],
    emails: &HashMap<Uuid, String>,
) -> Vec<EmailList> {
    sections
        .iter()
        .map(|section| {
            let leaders = with_status(applications, ApplicationStatus::Leader)
                .filter(|a| assigned_trip(a, trips).is_some_and(|t| t.section == section.id));
            EmailList::new(format!("{} leaders", section.name), applicant_emails(leaders, emails))
        })
        .collect()
}

pub fn incoming_lists(
    students: &[IncomingStudent],
    registrations: &[Registration],
    trips_year: i32,
) -> Vec<EmailList> {
    let unregistered = unregistered(students, trips_year);
    vec![
        EmailList::new(
            "unregistered personal emails",
            unregistered.iter().map(|s| s.email.clone()).collect(),
        ),
        EmailList::new(
            "unregistered blitz",
            unregistered.iter().map(|s| s.blitz.clone()).collect(),
        ),
        EmailList::new(
            "registrations",
            registrations.iter().map(|r| r.email.clone()).collect(),
        ),
    ]
}

/// Students with a trip assignment, overall and per section, by personal
/// email and by blitz.
pub fn trippee_lists(students: &[IncomingStudent], trips: &[Trip], sections: &[Section]) -> Vec<EmailList> {
    let section_of: HashMap<Uuid, Uuid> = trips.iter().map(|t| (t.id, t.section)).collect();
    let trippees: Vec<&IncomingStudent> = students
        .iter()
        .filter(|s| s.trip_assignment.is_some())
        .collect();

    let mut lists = vec![
        EmailList::new(
            "All Trippees (Incoming Students with a trip assignment)",
            trippees.iter().map(|s| s.email.clone()).collect(),
        ),
        EmailList::new(
            "All Trippees - blitz",
            trippees.iter().map(|s| s.blitz.clone()).collect(),
        ),
    ];
    for section in sections {
        let in_section: Vec<&&IncomingStudent> = trippees
            .iter()
            .filter(|s| {
                s.trip_assignment
                    .and_then(|trip| section_of.get(&trip))
                    .is_some_and(|id| *id == section.id)
            })
            .collect();
        lists.push(EmailList::new(
            format!("Section {} trippees", section.name),
            in_section.iter().map(|s| s.email.clone()).collect(),
        ));
        lists.push(EmailList::new(
            format!("Section {} trippees - blitz", section.name),
            in_section.iter().map(|s| s.blitz.clone()).collect(),
        ));
    }
    lists
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applications::TshirtSize;
    use chrono::NaiveDate;

    fn list<'a>(lists: &'a [EmailList], name: &str) -> &'a [String] {
        &lists.iter().find(|l| l.name == name).unwrap().emails
    }

    fn application(status: ApplicationStatus, emails: &mut HashMap<Uuid, String>, email: &str) -> GeneralApplication {
        let mut app = GeneralApplication::new(2024, Uuid::new_v4(), email, email, TshirtSize::M);
        app.status = status;
        emails.insert(app.applicant, format!("{email}@dartmouth.edu"));
        app
    }

    #[test]
    fn test_applicant_lists_split_by_status_and_completeness() {
        let mut emails = HashMap::new();
        let mut leader = application(ApplicationStatus::Leader, &mut emails, "leader");
        leader.leader_supplement.document = "answers".to_string();
        let pending = application(ApplicationStatus::Pending, &mut emails, "pending");
        let no_account = GeneralApplication::new(2024, Uuid::new_v4(), "Ghost", "ghost", TshirtSize::S);

        let lists = applicant_lists(&[leader, pending, no_account], &emails);
        assert_eq!(lists.len(), 9);
        assert_eq!(list(&lists, "all applicants").len(), 2);
        assert_eq!(list(&lists, "complete leader applications"), ["leader@dartmouth.edu"]);
        assert_eq!(list(&lists, "incomplete leader applications"), ["pending@dartmouth.edu"]);
        assert_eq!(list(&lists, "leaders"), ["leader@dartmouth.edu"]);
        assert!(list(&lists, "croo members").is_empty());
    }

    #[test]
    fn test_leaders_grouped_by_section_and_triptype() {
        let day = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        let a = Section::new(2024, "A", day);
        let b = Section::new(2024, "B", day);
        let hiking = TripType::new(2024, "Hiking");
        let canoe = TripType::new(2024, "Canoeing");
        let template = TripTemplate::new(2024, 101, hiking.id, 10);
        let trip = Trip::new(2024, template.id, a.id);

        let mut emails = HashMap::new();
        let mut leader = application(ApplicationStatus::Leader, &mut emails, "lead");
        leader.leader_supplement.assigned_trip = Some(trip.id);
        let waitlisted = application(ApplicationStatus::LeaderWaitlist, &mut emails, "wait");
        let apps = [leader, waitlisted];
        let trips = [trip];

        let by_section = leaders_by_section(&apps, &trips, &[a, b], &emails);
        assert_eq!(by_section[0].name, "A leaders");
        assert_eq!(by_section[0].emails, ["lead@dartmouth.edu"]);
        assert!(by_section[1].emails.is_empty());

        let by_type = leaders_by_triptype(&apps, &trips, &[template], &[hiking, canoe], &emails);
        assert_eq!(by_type[0].name, "Hiking leaders");
        assert_eq!(by_type[0].emails, ["lead@dartmouth.edu"]);
        assert!(by_type[1].emails.is_empty());
    }

    #[test]
    fn test_trippee_lists_follow_trip_sections() {
        let day = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        let a = Section::new(2024, "A", day);
        let b = Section::new(2024, "B", day);
        let trip = Trip::new(2024, Uuid::new_v4(), b.id);

        let mut on_trip = IncomingStudent::new(2024, "Jane", "d1");
        on_trip.email = "jane@gmail.com".to_string();
        on_trip.blitz = "jane@dartmouth.edu".to_string();
        on_trip.trip_assignment = Some(trip.id);
        let mut no_trip = IncomingStudent::new(2024, "Joe", "d2");
        no_trip.email = "joe@gmail.com".to_string();

        let lists = trippee_lists(&[on_trip, no_trip.clone()], &[trip], &[a, b]);
        assert_eq!(lists.len(), 6);
        assert_eq!(list(&lists, "All Trippees - blitz"), ["jane@dartmouth.edu"]);
        assert!(list(&lists, "Section A trippees").is_empty());
        assert_eq!(list(&lists, "Section B trippees"), ["jane@gmail.com"]);

        let incoming = incoming_lists(&[no_trip], &[], 2024);
        assert_eq!(list(&incoming, "unregistered personal emails"), ["joe@gmail.com"]);
        assert!(list(&incoming, "registrations").is_empty());
    }
}
