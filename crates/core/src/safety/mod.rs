//! The safety log: incidents called in during trips and their follow-ups.

mod types;

pub use types::{open_incidents, CallerRole, Incident, IncidentStatus, IncidentUpdate, SafetyError};
