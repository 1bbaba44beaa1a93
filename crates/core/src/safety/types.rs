use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::record::{newest_first, OnDelete, Record, RecordKind, Reference, References, ValidationError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SafetyError {
    #[error("{0} cannot be empty")]
    Required(&'static str),
}

impl From<SafetyError> for ValidationError {
    fn from(err: SafetyError) -> Self {
        ValidationError(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallerRole {
    TripLeader,
    CrooMember,
    Trippee,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentStatus {
    #[default]
    Open,
    Resolved,
}

fn required(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(SafetyError::Required(field).into());
    }
    Ok(())
}

/// An incident report in the safety log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub id: Uuid,
    pub trips_year: i32,
    /// Who entered the report.
    #[serde(default)]
    pub user: Uuid,
    #[serde(default)]
    pub netid: String,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    /// Who called it in.
    pub caller: String,
    pub caller_role: CallerRole,
    pub caller_number: String,
    #[serde(default)]
    pub status: IncidentStatus,
    /// Blank if the incident did not happen on a trip.
    #[serde(default, deserialize_with = "crate::serde::optional_uuid")]
    pub trip: Option<Uuid>,
    /// Trail name, campsite, Hanover, Lodge, etc.
    #[serde(rename = "where")]
    pub location: String,
    pub when: DateTime<Utc>,
    #[serde(default)]
    pub injuries: bool,
    /// Who this happened to.
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub subject_role: Option<CallerRole>,
    pub desc: String,
    #[serde(default)]
    pub resp: String,
    #[serde(default)]
    pub outcome: String,
    #[serde(default)]
    pub follow_up: String,
}

impl Incident {
    pub fn is_open(&self) -> bool {
        self.status == IncidentStatus::Open
    }
}

impl Record for Incident {
    const KIND: RecordKind = RecordKind::Incident;

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        self.when.format("%m/%d %H:%M").to_string()
    }

    // A trip going away should not erase the log.
    fn references(&self) -> Vec<Reference> {
        References::new()
            .maybe(RecordKind::Trip, self.trip, "/trip", OnDelete::SetNull)
            .build()
    }

    /// Open incidents first, then most recent.
    fn sort_key(&self) -> String {
        let status = match self.status {
            IncidentStatus::Open => "0",
            IncidentStatus::Resolved => "1",
        };
        format!("{status}{}", newest_first(self.when))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        required(&self.caller, "Caller")?;
        required(&self.caller_number, "Caller number")?;
        required(&self.location, "Where")?;
        required(&self.desc, "Description")
    }
}

/// A follow-up call about an incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentUpdate {
    pub id: Uuid,
    pub trips_year: i32,
    #[serde(default)]
    pub user: Uuid,
    #[serde(default)]
    pub netid: String,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    pub caller: String,
    pub caller_role: CallerRole,
    pub caller_number: String,
    pub incident: Uuid,
    pub update: String,
}

impl Record for IncidentUpdate {
    const KIND: RecordKind = RecordKind::IncidentUpdate;

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        format!("Update {}", self.created.format("%m/%d %H:%M"))
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(RecordKind::Incident, self.incident, "/incident", OnDelete::Cascade)]
    }

    fn sort_key(&self) -> String {
        self.created.to_rfc3339()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        required(&self.caller, "Caller")?;
        required(&self.update, "Update")
    }
}

/// Incidents still waiting on a resolution, most recent first.
pub fn open_incidents(incidents: &[Incident]) -> Vec<&Incident> {
    let mut open: Vec<&Incident> = incidents.iter().filter(|i| i.is_open()).collect();
    open.sort_by(|a, b| b.when.cmp(&a.when));
    open
}
