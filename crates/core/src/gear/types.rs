use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::record::{OnDelete, Record, RecordKind, Reference, References, ValidationError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GearError {
    #[error("Name cannot be empty")]
    EmptyName,
    #[error("Only incoming students and trips volunteers may request gear.")]
    NoRequester,
}

impl From<GearError> for ValidationError {
    fn from(err: GearError) -> Self {
        ValidationError(err.to_string())
    }
}

/// An item trippees and volunteers can borrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gear {
    pub id: Uuid,
    pub trips_year: i32,
    pub name: String,
}

impl Gear {
    pub fn new(trips_year: i32, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            name: name.into(),
        }
    }
}

impl Record for Gear {
    const KIND: RecordKind = RecordKind::Gear;

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(GearError::EmptyName.into());
        }
        Ok(())
    }
}

/// Who is asking for gear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    IncomingStudent(Uuid),
    Volunteer(Uuid),
}

/// The gear one trippee or volunteer asked for, and what will be provided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GearRequest {
    pub id: Uuid,
    pub trips_year: i32,
    #[serde(default, deserialize_with = "crate::serde::optional_uuid")]
    pub incoming_student: Option<Uuid>,
    /// The volunteer's application.
    #[serde(default, deserialize_with = "crate::serde::optional_uuid")]
    pub volunteer: Option<Uuid>,
    /// Requester name at the time of the request.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gear: Vec<Uuid>,
    #[serde(default)]
    pub additional: String,
    #[serde(default)]
    pub provided: Vec<Uuid>,
    /// Why requested gear is not being provided, if applicable.
    #[serde(default)]
    pub provided_comments: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl GearRequest {
    pub fn new(trips_year: i32, requester: Requester, name: impl Into<String>) -> Self {
        let (incoming_student, volunteer) = match requester {
            Requester::IncomingStudent(id) => (Some(id), None),
            Requester::Volunteer(id) => (None, Some(id)),
        };
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            trips_year,
            incoming_student,
            volunteer,
            name: name.into(),
            gear: Vec::new(),
            additional: String::new(),
            provided: Vec::new(),
            provided_comments: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn requester(&self) -> Option<Requester> {
        match (self.incoming_student, self.volunteer) {
            (Some(student), None) => Some(Requester::IncomingStudent(student)),
            (None, Some(volunteer)) => Some(Requester::Volunteer(volunteer)),
            _ => None,
        }
    }
}

impl Record for GearRequest {
    const KIND: RecordKind = RecordKind::GearRequest;
    const UNIQUE_FIELDS: &'static str = "requester";

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        format!("GearRequest ({})", self.name)
    }

    fn unique_key(&self) -> Option<String> {
        self.incoming_student.or(self.volunteer).map(|id| id.to_string())
    }

    fn references(&self) -> Vec<Reference> {
        References::new()
            .maybe(
                RecordKind::IncomingStudent,
                self.incoming_student,
                "/incoming_student",
                OnDelete::Protect,
            )
            .maybe(RecordKind::Application, self.volunteer, "/volunteer", OnDelete::Protect)
            .many(RecordKind::Gear, &self.gear, "/gear")
            .many(RecordKind::Gear, &self.provided, "/provided")
            .build()
    }

    fn sort_key(&self) -> String {
        let role = if self.incoming_student.is_some() { "0" } else { "1" };
        format!("{role}{}", self.name)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.requester().is_none() {
            return Err(GearError::NoRequester.into());
        }
        Ok(())
    }
}

/// How many of one item were requested and how many will be handed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GearTotal {
    pub gear: Uuid,
    pub name: String,
    pub requested: usize,
    pub provided: usize,
}

/// Per-item counts across every request, in the order of `gear`.
pub fn gear_totals(gear: &[Gear], requests: &[GearRequest]) -> Vec<GearTotal> {
    let mut requested: HashMap<Uuid, usize> = HashMap::new();
    let mut provided: HashMap<Uuid, usize> = HashMap::new();
    for request in requests {
        for item in &request.gear {
            *requested.entry(*item).or_default() += 1;
        }
        for item in &request.provided {
            *provided.entry(*item).or_default() += 1;
        }
    }
    gear.iter()
        .map(|item| GearTotal {
            gear: item.id,
            name: item.name.clone(),
            requested: requested.get(&item.id).copied().unwrap_or(0),
            provided: provided.get(&item.id).copied().unwrap_or(0),
        })
        .collect()
}
