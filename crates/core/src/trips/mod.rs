mod error;
mod schedule;
mod types;

pub use error::TripError;
pub use schedule::{
    campsite_occupancy, sections_for_template, trip_label, trip_matrix, trip_sort_key,
    CampsiteNight, EffectiveRoutes, TripDates, TripMatrix,
};
pub use types::{Campsite, Section, Trip, TripTemplate, TripType, MAX_TEMPLATE_NAME};
