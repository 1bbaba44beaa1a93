use thiserror::Error;

use crate::record::ValidationError;

/// Errors raised when validating transport records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Name cannot be empty")]
    EmptyName,
    #[error("{0} must set either lat_lng or address")]
    MissingLocation(String),
    #[error("Invalid coordinates {0:?}, expected 'lat,lng'")]
    InvalidLatLng(String),
    #[error("{0} requires round-trip cost")]
    MissingRoundTripCost(String),
    #[error("{0} requires one-way cost")]
    MissingOneWayCost(String),
    #[error("internal stop cannot have cost")]
    InternalStopCost,
    #[error("route must be internal")]
    RouteMustBeInternal,
    #[error("route must be external")]
    RouteMustBeExternal,
}

impl From<TransportError> for ValidationError {
    fn from(err: TransportError) -> Self {
        ValidationError(err.to_string())
    }
}

/// Errors from the map directions service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("Only one stop provided")]
    TooFewStops,
    #[error("Expecting one route, got {0}")]
    RouteCount(usize),
    #[error("Waypoints out of order")]
    WaypointsOutOfOrder,
    #[error("mismatched stops and legs")]
    LegMismatch,
    #[error("mismatched end and start stops on recursion")]
    ChunkMismatch,
    #[error("Directions service returned status {0}")]
    Status(String),
    #[error("Directions request failed: {0}")]
    Http(String),
}
