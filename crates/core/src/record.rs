//! Year-scoped records.
//!
//! Every row in the trips database belongs to exactly one trips year. The
//! [`Record`] trait describes what the storage layer needs to know about a
//! domain type: its kind, its year, its uniqueness constraint, and the other
//! records it points at (with the behavior to apply when a target is deleted).
//!
//! Records are persisted as [`StoredRecord`] documents so a single generic
//! store can hold every kind.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::RepositoryError;

/// Every kind of year-scoped record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Section,
    TripType,
    Campsite,
    TripTemplate,
    Trip,
    Vehicle,
    Route,
    Stop,
    TransportConfig,
    ScheduledTransport,
    ExternalBus,
    Croo,
    Application,
    LeaderGrade,
    CrooGrade,
    IncomingStudent,
    Registration,
    IncomingSettings,
    Raid,
    RaidComment,
    RaidInfo,
    Incident,
    IncidentUpdate,
    Gear,
    GearRequest,
    Training,
    TrainingSession,
    Attendee,
    ApplicationInfo,
    PortalContent,
}

impl RecordKind {
    pub const ALL: [RecordKind; 30] = [
        RecordKind::Section,
        RecordKind::TripType,
        RecordKind::Campsite,
        RecordKind::TripTemplate,
        RecordKind::Trip,
        RecordKind::Vehicle,
        RecordKind::Route,
        RecordKind::Stop,
        RecordKind::TransportConfig,
        RecordKind::ScheduledTransport,
        RecordKind::ExternalBus,
        RecordKind::Croo,
        RecordKind::Application,
        RecordKind::LeaderGrade,
        RecordKind::CrooGrade,
        RecordKind::IncomingStudent,
        RecordKind::Registration,
        RecordKind::IncomingSettings,
        RecordKind::Raid,
        RecordKind::RaidComment,
        RecordKind::RaidInfo,
        RecordKind::Incident,
        RecordKind::IncidentUpdate,
        RecordKind::Gear,
        RecordKind::GearRequest,
        RecordKind::Training,
        RecordKind::TrainingSession,
        RecordKind::Attendee,
        RecordKind::ApplicationInfo,
        RecordKind::PortalContent,
    ];

    /// Storage identifier, also used as the entity type in errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::TripType => "trip_type",
            Self::Campsite => "campsite",
            Self::TripTemplate => "trip_template",
            Self::Trip => "trip",
            Self::Vehicle => "vehicle",
            Self::Route => "route",
            Self::Stop => "stop",
            Self::TransportConfig => "transport_config",
            Self::ScheduledTransport => "scheduled_transport",
            Self::ExternalBus => "external_bus",
            Self::Croo => "croo",
            Self::Application => "application",
            Self::LeaderGrade => "leader_grade",
            Self::CrooGrade => "croo_grade",
            Self::IncomingStudent => "incoming_student",
            Self::Registration => "registration",
            Self::IncomingSettings => "incoming_settings",
            Self::Raid => "raid",
            Self::RaidComment => "raid_comment",
            Self::RaidInfo => "raid_info",
            Self::Incident => "incident",
            Self::IncidentUpdate => "incident_update",
            Self::Gear => "gear",
            Self::GearRequest => "gear_request",
            Self::Training => "training",
            Self::TrainingSession => "training_session",
            Self::Attendee => "attendee",
            Self::ApplicationInfo => "application_info",
            Self::PortalContent => "portal_content",
        }
    }

    /// Human readable name used in user-facing messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Section => "Section",
            Self::TripType => "Trip Type",
            Self::Campsite => "Campsite",
            Self::TripTemplate => "Trip Template",
            Self::Trip => "Trip",
            Self::Vehicle => "Vehicle",
            Self::Route => "Route",
            Self::Stop => "Stop",
            Self::TransportConfig => "Transport Config",
            Self::ScheduledTransport => "Scheduled Transport",
            Self::ExternalBus => "External Bus",
            Self::Croo => "Croo",
            Self::Application => "Application",
            Self::LeaderGrade => "Leader Application Grade",
            Self::CrooGrade => "Croo Application Grade",
            Self::IncomingStudent => "Incoming Student",
            Self::Registration => "Registration",
            Self::IncomingSettings => "Settings",
            Self::Raid => "Raid",
            Self::RaidComment => "Raid Comment",
            Self::RaidInfo => "Raid Info",
            Self::Incident => "Incident",
            Self::IncidentUpdate => "Incident Update",
            Self::Gear => "Gear",
            Self::GearRequest => "Gear Request",
            Self::Training => "Training",
            Self::TrainingSession => "Training Session",
            Self::Attendee => "Attendee",
            Self::ApplicationInfo => "Application Info",
            Self::PortalContent => "Portal Content",
        }
    }

    /// Parses a storage identifier produced by [`RecordKind::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// What happens to a referencing record when its target is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnDelete {
    /// The target cannot be deleted while this reference exists.
    Protect,
    /// The referencing field is cleared.
    SetNull,
    /// The target id is removed from a list field.
    Remove,
    /// The referencing record is deleted along with the target.
    Cascade,
}

impl OnDelete {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Protect => "PROTECT",
            Self::SetNull => "SET_NULL",
            Self::Remove => "REMOVE",
            Self::Cascade => "CASCADE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PROTECT" => Some(Self::Protect),
            "SET_NULL" => Some(Self::SetNull),
            "REMOVE" => Some(Self::Remove),
            "CASCADE" => Some(Self::Cascade),
            _ => None,
        }
    }
}

/// An outgoing reference from one record to another.
///
/// `field` is a JSON pointer into the referencing record's document, e.g.
/// `/route` or `/croo_supplement/assigned_croo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub kind: RecordKind,
    pub target: Uuid,
    pub field: String,
    pub on_delete: OnDelete,
}

impl Reference {
    pub fn new(kind: RecordKind, target: Uuid, field: &str, on_delete: OnDelete) -> Self {
        Self {
            kind,
            target,
            field: field.to_string(),
            on_delete,
        }
    }

    pub fn protect(kind: RecordKind, target: Uuid, field: &str) -> Self {
        Self::new(kind, target, field, OnDelete::Protect)
    }
}

/// Collects references, skipping unset optional fields.
#[derive(Debug, Default)]
pub struct References(Vec<Reference>);

impl References {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn one(mut self, kind: RecordKind, target: Uuid, field: &str, on_delete: OnDelete) -> Self {
        self.0.push(Reference::new(kind, target, field, on_delete));
        self
    }

    pub fn maybe(
        self,
        kind: RecordKind,
        target: Option<Uuid>,
        field: &str,
        on_delete: OnDelete,
    ) -> Self {
        match target {
            Some(target) => self.one(kind, target, field, on_delete),
            None => self,
        }
    }

    pub fn many(mut self, kind: RecordKind, targets: &[Uuid], field: &str) -> Self {
        for target in targets {
            self.0
                .push(Reference::new(kind, *target, field, OnDelete::Remove));
        }
        self
    }

    pub fn build(self) -> Vec<Reference> {
        self.0
    }
}

/// A record failed a field-level check before being saved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// A domain type stored in the trips database.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: RecordKind;

    /// Field names covered by [`Record::unique_key`], for error messages.
    const UNIQUE_FIELDS: &'static str = "";

    fn id(&self) -> Uuid;

    fn trips_year(&self) -> i32;

    /// Display label, e.g. `A12` for a trip.
    fn label(&self) -> String;

    /// Key that must be unique among records of this kind in one year.
    fn unique_key(&self) -> Option<String> {
        None
    }

    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    /// Key used to order listings.
    fn sort_key(&self) -> String {
        self.label()
    }

    /// Checks that only need the record itself.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Sort key that lists later timestamps first.
pub fn newest_first(at: chrono::DateTime<chrono::Utc>) -> String {
    format!("{:020}", i64::MAX.saturating_sub(at.timestamp_micros()))
}

/// A record as persisted by a [`crate::storage::RecordStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub kind: RecordKind,
    pub id: Uuid,
    pub trips_year: i32,
    pub label: String,
    pub sort_key: String,
    pub unique_key: Option<String>,
    pub references: Vec<Reference>,
    pub data: serde_json::Value,
}

impl StoredRecord {
    /// Encodes a domain record.
    pub fn encode<T: Record>(record: &T) -> Result<Self, RepositoryError> {
        let data = serde_json::to_value(record)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        Ok(Self {
            kind: T::KIND,
            id: record.id(),
            trips_year: record.trips_year(),
            label: record.label(),
            sort_key: record.sort_key(),
            unique_key: record.unique_key(),
            references: record.references(),
            data,
        })
    }

    /// Decodes the document back into its domain type.
    pub fn decode<T: Record>(&self) -> Result<T, RepositoryError> {
        if self.kind != T::KIND {
            return Err(RepositoryError::InvalidData(format!(
                "expected {} but found {}",
                T::KIND.as_str(),
                self.kind.as_str()
            )));
        }
        serde_json::from_value(self.data.clone())
            .map_err(|e| RepositoryError::Serialization(e.to_string()))
    }

    /// References pointing at `target`.
    pub fn references_to(&self, target: Uuid) -> impl Iterator<Item = &Reference> {
        self.references.iter().filter(move |r| r.target == target)
    }

    /// Detaches every non-protecting reference to `target` from the document.
    ///
    /// Optional fields are set to null and list fields lose the id. Cascade and
    /// protect references are left in place.
    pub fn detach(&mut self, target: Uuid) -> Result<(), RepositoryError> {
        let target_str = target.to_string();
        for reference in self.references.iter().filter(|r| r.target == target) {
            let slot = self.data.pointer_mut(&reference.field).ok_or_else(|| {
                RepositoryError::InvalidData(format!(
                    "{} has no field {}",
                    self.kind.as_str(),
                    reference.field
                ))
            })?;
            match reference.on_delete {
                OnDelete::SetNull => *slot = serde_json::Value::Null,
                OnDelete::Remove => {
                    if let serde_json::Value::Array(items) = slot {
                        items.retain(|item| item.as_str() != Some(target_str.as_str()));
                    }
                }
                OnDelete::Protect | OnDelete::Cascade => {}
            }
        }
        self.references.retain(|r| {
            r.target != target || matches!(r.on_delete, OnDelete::Protect | OnDelete::Cascade)
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Widget {
        id: Uuid,
        trips_year: i32,
        name: String,
        owner: Option<Uuid>,
        tags: Vec<Uuid>,
    }

    impl Record for Widget {
        const KIND: RecordKind = RecordKind::Croo;

        fn id(&self) -> Uuid {
            self.id
        }

        fn trips_year(&self) -> i32 {
            self.trips_year
        }

        fn label(&self) -> String {
            self.name.clone()
        }

        fn references(&self) -> Vec<Reference> {
            References::new()
                .maybe(RecordKind::Route, self.owner, "/owner", OnDelete::SetNull)
                .many(RecordKind::Section, &self.tags, "/tags")
                .build()
        }
    }

    #[test]
    fn test_kind_parse_roundtrips_every_kind() {
        for kind in RecordKind::ALL {
            assert_eq!(RecordKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(RecordKind::parse("nope"), None);
    }

    #[test]
    fn test_decode_rejects_wrong_kind() {
        let widget = Widget {
            id: Uuid::new_v4(),
            trips_year: 2024,
            name: "w".to_string(),
            owner: None,
            tags: vec![],
        };
        let mut stored = StoredRecord::encode(&widget).unwrap();
        stored.kind = RecordKind::Stop;

        assert!(matches!(
            stored.decode::<Widget>(),
            Err(RepositoryError::InvalidData(_))
        ));
    }

    #[test]
    fn test_detach_clears_optional_and_list_fields() {
        let target = Uuid::new_v4();
        let other = Uuid::new_v4();
        let widget = Widget {
            id: Uuid::new_v4(),
            trips_year: 2024,
            name: "w".to_string(),
            owner: Some(target),
            tags: vec![target, other],
        };
        let mut stored = StoredRecord::encode(&widget).unwrap();
        assert_eq!(stored.references_to(target).count(), 2);

        stored.detach(target).unwrap();

        let decoded: Widget = stored.decode().unwrap();
        assert_eq!(decoded.owner, None);
        assert_eq!(decoded.tags, vec![other]);
        assert_eq!(stored.references_to(target).count(), 0);
        assert_eq!(stored.references.len(), 1);
    }
}
