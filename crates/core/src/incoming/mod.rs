mod charges;
mod error;
mod import;
mod matching;
mod types;

pub use charges::{adjust, bus_cost, compute_charges, Charges};
pub use error::IncomingError;
pub use import::{
    parse_hinman_boxes, parse_registrar_csv, HinmanImport, HinmanSummary, ImportSummary,
    RegistrarImport,
};
pub use matching::{
    available_for_trip, external_riders, registration_for_student, student_for_registration,
    trip_choices, unmatched, unregistered, want_bus, want_financial_aid, TripChoices,
};
pub use types::{IncomingSettings, IncomingStatus, IncomingStudent, Registration, SwimmingAbility};
