use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::{OnDelete, Record, RecordKind, Reference, References, ValidationError};

use super::TransportError;

/// A type of vehicle, e.g. Internal Bus or Microbus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub trips_year: i32,
    pub name: String,
    pub capacity: u32,
}

impl Vehicle {
    pub fn new(trips_year: i32, name: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            name: name.into(),
            capacity,
        }
    }
}

impl Record for Vehicle {
    const KIND: RecordKind = RecordKind::Vehicle;

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
            return Err(TransportError::EmptyName.into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteCategory {
    /// Moves trips between Hanover, their trailheads, and the Lodge.
    Internal,
    /// Brings local students to and from campus around their trip.
    External,
}

/// A bus route: the stops a single vehicle serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub trips_year: i32,
    pub name: String,
    pub category: RouteCategory,
    pub vehicle: Uuid,
}

impl Route {
    pub fn new(
        trips_year: i32,
        name: impl Into<String>,
        category: RouteCategory,
        vehicle: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            name: name.into(),
            category,
            vehicle,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.category == RouteCategory::Internal
    }
}

impl Record for Route {
    const KIND: RecordKind = RecordKind::Route;

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::protect(RecordKind::Vehicle, self.vehicle, "/vehicle")]
    }

    fn sort_key(&self) -> String {
        let category = match self.category {
            RouteCategory::External => "0",
            RouteCategory::Internal => "1",
        };
        format!("{category}{}", self.name)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(TransportError::EmptyName.into());
        }
        Ok(())
    }
}

/// A pickup or dropoff point for a trip, or a bus stop for local students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    pub id: Uuid,
    pub trips_year: i32,
    pub name: String,
    /// Plain text address that resolves in the maps API.
    #[serde(default)]
    pub address: String,
    /// Coordinates, e.g. `43.7030,-72.2895`.
    #[serde(default)]
    pub lat_lng: String,
    #[serde(default)]
    pub directions: String,
    /// Default bus route.
    #[serde(default, deserialize_with = "crate::serde::optional_uuid")]
    pub route: Option<Uuid>,
    /// Cents. Required on external routes.
    #[serde(default)]
    pub cost_round_trip: Option<u32>,
    /// Cents. Required on external routes.
    #[serde(default)]
    pub cost_one_way: Option<u32>,
    #[serde(default, deserialize_with = "crate::serde::optional_time")]
    pub dropoff_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "crate::serde::optional_time")]
    pub pickup_time: Option<NaiveTime>,
    /// Rough distance from Hanover, used to order stops on a bus.
    pub distance: u32,
}

impl Stop {
    pub fn new(trips_year: i32, name: impl Into<String>, distance: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            name: name.into(),
            address: String::new(),
            lat_lng: String::new(),
            directions: String::new(),
            route: None,
            cost_round_trip: None,
            cost_one_way: None,
            dropoff_time: None,
            pickup_time: None,
            distance,
        }
    }

    /// Coordinates when set, since they are more precise than the address.
    pub fn location(&self) -> &str {
        if self.lat_lng.is_empty() {
            &self.address
        } else {
            &self.lat_lng
        }
    }

    /// Cost checks that depend on the category of the stop's route.
    pub fn validate_for_route(&self, category: Option<RouteCategory>) -> Result<(), TransportError> {
        match category {
            Some(RouteCategory::External) => {
                if self.cost_round_trip.unwrap_or(0) == 0 {
                    return Err(TransportError::MissingRoundTripCost(self.name.clone()));
                }
                if self.cost_one_way.unwrap_or(0) == 0 {
                    return Err(TransportError::MissingOneWayCost(self.name.clone()));
                }
            }
            Some(RouteCategory::Internal) => {
                if self.cost_round_trip.unwrap_or(0) > 0 || self.cost_one_way.unwrap_or(0) > 0 {
                    return Err(TransportError::InternalStopCost);
                }
            }
            None => {}
        }
        Ok(())
    }
}

/// Checks a `lat,lng` coordinate pair.
pub fn validate_lat_lng(value: &str) -> Result<(), TransportError> {
    let invalid = || TransportError::InvalidLatLng(value.to_string());
    let (lat, lng) = value.split_once(',').ok_or_else(invalid)?;
    let is_decimal = |s: &str| {
        let s = s.trim();
        !s.is_empty() && s.parse::<f64>().map(f64::is_finite).unwrap_or(false)
    };
    if is_decimal(lat) && is_decimal(lng) {
        Ok(())
    } else {
        Err(invalid())
    }
}

impl Record for Stop {
    const KIND: RecordKind = RecordKind::Stop;

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn references(&self) -> Vec<Reference> {
        References::new()
            .maybe(RecordKind::Route, self.route, "/route", OnDelete::SetNull)
            .build()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.lat_lng.is_empty() && self.address.is_empty() {
            return Err(TransportError::MissingLocation(self.name.clone()).into());
        }
        if !self.lat_lng.is_empty() {
            validate_lat_lng(&self.lat_lng)?;
        }
        Ok(())
    }
}

/// Which stops stand in for Hanover and the Lodge in a given year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    pub id: Uuid,
    pub trips_year: i32,
    pub hanover: Uuid,
    pub lodge: Uuid,
}

impl Record for TransportConfig {
    const KIND: RecordKind = RecordKind::TransportConfig;
    const UNIQUE_FIELDS: &'static str = "trips year";

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        "Transport Config".to_string()
    }

    fn unique_key(&self) -> Option<String> {
        Some("transport_config".to_string())
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::protect(RecordKind::Stop, self.hanover, "/hanover"),
            Reference::protect(RecordKind::Stop, self.lodge, "/lodge"),
        ]
    }
}

/// An internal bus running a route on a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTransport {
    pub id: Uuid,
    pub trips_year: i32,
    pub route: Uuid,
    pub date: NaiveDate,
    /// For the bus driver.
    #[serde(default)]
    pub notes: String,
}

impl ScheduledTransport {
    pub fn new(trips_year: i32, route: Uuid, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            route,
            date,
            notes: String::new(),
        }
    }

    pub fn check_route(route: &Route) -> Result<(), TransportError> {
        if route.is_internal() {
            Ok(())
        } else {
            Err(TransportError::RouteMustBeInternal)
        }
    }

    /// Display label once the route is known, e.g. `Green Route: 08/12/24`.
    pub fn describe(&self, route: &Route) -> String {
        format!("{}: {}", route.name, self.date.format("%m/%d/%y"))
    }
}

impl Record for ScheduledTransport {
    const KIND: RecordKind = RecordKind::ScheduledTransport;
    const UNIQUE_FIELDS: &'static str = "route and date";

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        self.date.format("%m/%d/%y").to_string()
    }

    fn unique_key(&self) -> Option<String> {
        Some(format!("{}:{}", self.route, self.date))
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::protect(RecordKind::Route, self.route, "/route")]
    }

    fn sort_key(&self) -> String {
        self.date.to_string()
    }
}

/// A bus bringing local-section students to and from campus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalBus {
    pub id: Uuid,
    pub trips_year: i32,
    pub route: Uuid,
    pub section: Uuid,
}

impl ExternalBus {
    pub fn new(trips_year: i32, route: Uuid, section: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            route,
            section,
        }
    }

    pub fn check_route(route: &Route) -> Result<(), TransportError> {
        if route.is_internal() {
            Err(TransportError::RouteMustBeExternal)
        } else {
            Ok(())
        }
    }
}

impl Record for ExternalBus {
    const KIND: RecordKind = RecordKind::ExternalBus;
    const UNIQUE_FIELDS: &'static str = "route and section";

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        format!("External Bus {}", self.id)
    }

    fn unique_key(&self) -> Option<String> {
        Some(format!("{}:{}", self.route, self.section))
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::protect(RecordKind::Route, self.route, "/route"),
            Reference::protect(RecordKind::Section, self.section, "/section"),
        ]
    }
}
