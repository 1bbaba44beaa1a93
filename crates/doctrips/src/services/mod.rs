//! Outbound HTTP clients.

pub mod lookup;
pub mod maps;

pub use lookup::{DartmouthDirectory, Directory, LookupError};
pub use maps::{route_directions, DirectionsClient, MapsApi};
