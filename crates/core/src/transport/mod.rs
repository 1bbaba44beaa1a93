mod directions;
mod error;
mod external;
mod riders;
mod stops;
mod types;

pub use directions::{
    chunk_ranges, integrate_legs, join_legs, DirectionsRequest, DirectionsResponse,
    DirectionsRoute, Leg, LegStop, MAX_WAYPOINTS,
};
pub use error::{MapError, TransportError};
pub use external::{
    external_bus_matrix, passenger_matrix, riders_on, Direction, ExternalBusMatrix,
    ExternalRider, PassengerMatrix,
};
pub use riders::{
    actual_rider_matrix, all_trip_dates, internal_rider_matrix, internal_route_matrix,
    issues_matrix, leg_counts, route_capacities, IssueMatrix, LegCounts, RiderMatrix, Riders,
    RouteMatrix, TransportIssue, TransportedTrip,
};
pub use stops::{
    external_stops_from_hanover, external_stops_to_hanover, internal_bus_stops, Boarding,
    BusLoad, BusSchedule, BusStop, Passenger,
};
pub use types::{
    validate_lat_lng, ExternalBus, Route, RouteCategory, ScheduledTransport, Stop,
    TransportConfig, Vehicle,
};
