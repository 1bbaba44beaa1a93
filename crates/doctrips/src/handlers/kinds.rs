//! URL names of the record kinds and typed decoding of request payloads.

use doctrips_core::record::{Record, RecordKind, StoredRecord, ValidationError};
use serde_json::Value;

use super::AppError;

/// Runs `$body` with `$T` bound to the domain type stored under `$kind`.
macro_rules! with_record_type {
    ($kind:expr, $T:ident => $body:expr) => {{
        use doctrips_core::applications::{
            ApplicationInfo, Croo, CrooGrade, GeneralApplication, LeaderGrade, PortalContent,
        };
        use doctrips_core::gear::{Gear, GearRequest};
        use doctrips_core::incoming::{IncomingSettings, IncomingStudent, Registration};
        use doctrips_core::raids::{Raid, RaidComment, RaidInfo};
        use doctrips_core::record::RecordKind;
        use doctrips_core::safety::{Incident, IncidentUpdate};
        use doctrips_core::training::{Attendee, Training, TrainingSession};
        use doctrips_core::transport::{
            ExternalBus, Route, ScheduledTransport, Stop, TransportConfig, Vehicle,
        };
        use doctrips_core::trips::{Campsite, Section, Trip, TripTemplate, TripType};

        match $kind {
            RecordKind::Section => {
                type $T = Section;
                $body
            }
            RecordKind::TripType => {
                type $T = TripType;
                $body
            }
            RecordKind::Campsite => {
                type $T = Campsite;
                $body
            }
            RecordKind::TripTemplate => {
                type $T = TripTemplate;
                $body
            }
            RecordKind::Trip => {
                type $T = Trip;
                $body
            }
            RecordKind::Vehicle => {
                type $T = Vehicle;
                $body
            }
            RecordKind::Route => {
                type $T = Route;
                $body
            }
            RecordKind::Stop => {
                type $T = Stop;
                $body
            }
            RecordKind::TransportConfig => {
                type $T = TransportConfig;
                $body
            }
            RecordKind::ScheduledTransport => {
                type $T = ScheduledTransport;
                $body
            }
            RecordKind::ExternalBus => {
                type $T = ExternalBus;
                $body
            }
            RecordKind::Croo => {
                type $T = Croo;
                $body
            }
            RecordKind::Application => {
                type $T = GeneralApplication;
                $body
            }
            RecordKind::LeaderGrade => {
                type $T = LeaderGrade;
                $body
            }
            RecordKind::CrooGrade => {
                type $T = CrooGrade;
                $body
            }
            RecordKind::IncomingStudent => {
                type $T = IncomingStudent;
                $body
            }
            RecordKind::Registration => {
                type $T = Registration;
                $body
            }
            RecordKind::IncomingSettings => {
                type $T = IncomingSettings;
                $body
            }
            RecordKind::Raid => {
                type $T = Raid;
                $body
            }
            RecordKind::RaidComment => {
                type $T = RaidComment;
                $body
            }
            RecordKind::RaidInfo => {
                type $T = RaidInfo;
                $body
            }
            RecordKind::Incident => {
                type $T = Incident;
                $body
            }
            RecordKind::IncidentUpdate => {
                type $T = IncidentUpdate;
                $body
            }
            RecordKind::Gear => {
                type $T = Gear;
                $body
            }
            RecordKind::GearRequest => {
                type $T = GearRequest;
                $body
            }
            RecordKind::Training => {
                type $T = Training;
                $body
            }
            RecordKind::TrainingSession => {
                type $T = TrainingSession;
                $body
            }
            RecordKind::Attendee => {
                type $T = Attendee;
                $body
            }
            RecordKind::ApplicationInfo => {
                type $T = ApplicationInfo;
                $body
            }
            RecordKind::PortalContent => {
                type $T = PortalContent;
                $body
            }
        }
    }};
}

/// Path segment under `/db/{year}/` for each kind.
pub fn path_of(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Section => "sections",
        RecordKind::TripType => "triptypes",
        RecordKind::Campsite => "campsites",
        RecordKind::TripTemplate => "templates",
        RecordKind::Trip => "trips",
        RecordKind::Vehicle => "vehicles",
        RecordKind::Route => "routes",
        RecordKind::Stop => "stops",
        RecordKind::TransportConfig => "transport-config",
        RecordKind::ScheduledTransport => "scheduled-transports",
        RecordKind::ExternalBus => "external-buses",
        RecordKind::Croo => "croos",
        RecordKind::Application => "applications",
        RecordKind::LeaderGrade => "leader-grades",
        RecordKind::CrooGrade => "croo-grades",
        RecordKind::IncomingStudent => "incoming",
        RecordKind::Registration => "registrations",
        RecordKind::IncomingSettings => "settings",
        RecordKind::Raid => "raids",
        RecordKind::RaidComment => "raid-comments",
        RecordKind::RaidInfo => "raid-info",
        RecordKind::Incident => "incidents",
        RecordKind::IncidentUpdate => "incident-updates",
        RecordKind::Gear => "gear",
        RecordKind::GearRequest => "gear-requests",
        RecordKind::Training => "trainings",
        RecordKind::TrainingSession => "sessions",
        RecordKind::Attendee => "attendees",
        RecordKind::ApplicationInfo => "application-info",
        RecordKind::PortalContent => "portal-content",
    }
}

/// Fields named in the uniqueness error of a kind.
pub fn unique_fields(kind: RecordKind) -> &'static str {
    with_record_type!(kind, T => <T as Record>::UNIQUE_FIELDS)
}

fn build<T: Record>(data: Value) -> Result<StoredRecord, AppError> {
    let record: T = serde_json::from_value(data).map_err(|e| ValidationError(e.to_string()))?;
    record.validate()?;
    Ok(StoredRecord::encode(&record)?)
}

/// Decodes a payload as `kind`, runs its own validation and encodes it for storage.
pub fn build_record(kind: RecordKind, data: Value) -> Result<StoredRecord, AppError> {
    with_record_type!(kind, T => build::<T>(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_paths_are_distinct() {
        let mut paths: Vec<&str> = RecordKind::ALL.iter().map(|k| path_of(*k)).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), RecordKind::ALL.len());
    }

    #[test]
    fn test_build_record_validates() {
        let id = Uuid::new_v4();
        let ok = build_record(
            RecordKind::Section,
            json!({"id": id, "trips_year": 2024, "name": "A", "leaders_arrive": "2024-09-01"}),
        )
        .unwrap();
        assert_eq!(ok.id, id);
        assert_eq!(ok.label, "A");

        let too_long = build_record(
            RecordKind::Section,
            json!({"id": id, "trips_year": 2024, "name": "AB", "leaders_arrive": "2024-09-01"}),
        );
        assert!(too_long.is_err());

        let missing = build_record(RecordKind::Vehicle, json!({"id": id, "trips_year": 2024}));
        assert!(missing.is_err());
    }

    #[test]
    fn test_unique_fields() {
        assert_eq!(unique_fields(RecordKind::Trip), "template and section");
        assert_eq!(unique_fields(RecordKind::Croo), "");
    }
}
