//! Trips years and forwarding the database into a new year.

mod error;
mod forward;
mod types;

pub use error::ForwardError;
pub use forward::{forward_records, scrub_medical_info, FORWARD_ORDER, MEDICAL_KINDS};
pub use types::{TripsYear, YearSummary};
