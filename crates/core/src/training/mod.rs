//! Volunteer trainings, their scheduled sessions and who attended.

mod attendance;
mod types;

pub use attendance::{record_attendance, session_roster, SessionRoster};
pub use types::{Attendee, Training, TrainingError, TrainingSession};
