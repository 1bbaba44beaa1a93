use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::record::{OnDelete, Record, RecordKind, Reference, References, ValidationError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrainingError {
    #[error("Name cannot be empty")]
    EmptyName,
    #[error("Session must end after it starts")]
    EndsBeforeStart,
    #[error("{0} did not register for this session")]
    NotRegistered(String),
}

impl From<TrainingError> for ValidationError {
    fn from(err: TrainingError) -> Self {
        ValidationError(err.to_string())
    }
}

/// A type of training, e.g. First Aid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Training {
    pub id: Uuid,
    pub trips_year: i32,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Training {
    pub fn new(trips_year: i32, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            name: name.into(),
            description: String::new(),
        }
    }
}

impl Record for Training {
    const KIND: RecordKind = RecordKind::Training;

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
            return Err(TrainingError::EmptyName.into());
        }
        Ok(())
    }
}

/// A scheduled session of a training.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSession {
    pub id: Uuid,
    pub trips_year: i32,
    pub training: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl TrainingSession {
    pub fn new(
        trips_year: i32,
        training: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            training,
            date,
            start_time,
            end_time,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }

    /// Label including the training name, e.g. `First Aid: 09/01 14:00`.
    pub fn label_for(&self, training: &Training) -> String {
        format!("{}: {}", training.name, self.label())
    }
}

impl Record for TrainingSession {
    const KIND: RecordKind = RecordKind::TrainingSession;

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        format!("{} {}", self.date.format("%m/%d"), self.start_time.format("%H:%M"))
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::protect(RecordKind::Training, self.training, "/training")]
    }

    fn sort_key(&self) -> String {
        format!("{}T{}", self.date, self.start_time)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.end_time <= self.start_time {
            return Err(TrainingError::EndsBeforeStart.into());
        }
        Ok(())
    }
}

/// A volunteer's training record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub id: Uuid,
    pub trips_year: i32,
    /// The volunteer's application.
    pub volunteer: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub registered_sessions: Vec<Uuid>,
    #[serde(default)]
    pub complete_sessions: Vec<Uuid>,
}

impl Attendee {
    pub fn new(trips_year: i32, volunteer: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            volunteer,
            name: name.into(),
            registered_sessions: Vec::new(),
            complete_sessions: Vec::new(),
        }
    }

    pub fn registered_for(&self, session: Uuid) -> bool {
        self.registered_sessions.contains(&session)
    }

    pub fn completed(&self, session: Uuid) -> bool {
        self.complete_sessions.contains(&session)
    }
}

impl Record for Attendee {
    const KIND: RecordKind = RecordKind::Attendee;
    const UNIQUE_FIELDS: &'static str = "volunteer";

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        format!("Attendee {}", self.name)
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.volunteer.to_string())
    }

    fn references(&self) -> Vec<Reference> {
        References::new()
            .one(RecordKind::Application, self.volunteer, "/volunteer", OnDelete::Cascade)
            .many(RecordKind::TrainingSession, &self.registered_sessions, "/registered_sessions")
            .many(RecordKind::TrainingSession, &self.complete_sessions, "/complete_sessions")
            .build()
    }

    fn sort_key(&self) -> String {
        self.name.clone()
    }
}
