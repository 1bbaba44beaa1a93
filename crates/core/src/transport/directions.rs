//! Building directions requests for a bus route and checking the answers.
//!
//! The directions API accepts a limited number of waypoints, so long routes
//! are split into overlapping chunks whose legs are joined back together.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{MapError, Stop};

/// Waypoint limit imposed by the directions API.
pub const MAX_WAYPOINTS: usize = 8;

/// One directions call: origin, ordered waypoints and destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionsRequest {
    pub origin: String,
    pub waypoints: Vec<String>,
    pub destination: String,
}

impl DirectionsRequest {
    pub fn for_stops(stops: &[Stop]) -> Result<Self, MapError> {
        let (first, rest) = stops.split_first().ok_or(MapError::TooFewStops)?;
        let (last, middle) = rest.split_last().ok_or(MapError::TooFewStops)?;
        Ok(Self {
            origin: first.location().to_string(),
            waypoints: middle.iter().map(|s| s.location().to_string()).collect(),
            destination: last.location().to_string(),
        })
    }

    /// Query parameters for the directions endpoint.
    pub fn query(&self, key: &str) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("origin", self.origin.clone()),
            ("destination", self.destination.clone()),
        ];
        if !self.waypoints.is_empty() {
            query.push(("waypoints", self.waypoints.join("|")));
        }
        query.push(("key", key.to_string()));
        query
    }
}

/// Index ranges of `len` stops, one per directions call.
///
/// Consecutive ranges share a stop so the joined legs are continuous.
pub fn chunk_ranges(len: usize) -> Result<Vec<Range<usize>>, MapError> {
    if len < 2 {
        return Err(MapError::TooFewStops);
    }
    let mut ranges = Vec::new();
    split(0, len, &mut ranges);
    Ok(ranges)
}

fn split(start: usize, end: usize, out: &mut Vec<Range<usize>>) {
    if end - start - 2 > MAX_WAYPOINTS {
        split(start, start + MAX_WAYPOINTS, out);
        split(start + MAX_WAYPOINTS - 1, end, out);
    } else {
        out.push(start..end);
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectionsRoute {
    #[serde(default)]
    pub legs: Vec<Map<String, Value>>,
    #[serde(default)]
    pub waypoint_order: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegStop {
    pub id: Uuid,
    pub name: String,
    pub location: String,
}

impl From<&Stop> for LegStop {
    fn from(stop: &Stop) -> Self {
        Self {
            id: stop.id,
            name: stop.name.clone(),
            location: stop.location().to_string(),
        }
    }
}

/// A directions leg annotated with the stops it connects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leg {
    pub start_stop: LegStop,
    pub end_stop: LegStop,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// Checks a response for `stops` and pairs every leg with its stops.
pub fn integrate_legs(response: DirectionsResponse, stops: &[Stop]) -> Result<Vec<Leg>, MapError> {
    if !response.status.is_empty() && response.status != "OK" {
        return Err(MapError::Status(response.status));
    }
    let mut routes = response.routes;
    if routes.len() != 1 {
        return Err(MapError::RouteCount(routes.len()));
    }
    let route = routes.remove(0);

    let waypoints = stops.len().saturating_sub(2);
    if !route.waypoint_order.iter().copied().eq(0..waypoints) {
        return Err(MapError::WaypointsOutOfOrder);
    }
    if route.legs.len() + 1 != stops.len() {
        return Err(MapError::LegMismatch);
    }

    Ok(route
        .legs
        .into_iter()
        .zip(stops.windows(2))
        .map(|(details, pair)| Leg {
            start_stop: LegStop::from(&pair[0]),
            end_stop: LegStop::from(&pair[1]),
            details,
        })
        .collect())
}

/// Concatenates the legs of consecutive chunks.
pub fn join_legs(chunks: Vec<Vec<Leg>>) -> Result<Vec<Leg>, MapError> {
    let mut legs: Vec<Leg> = Vec::new();
    for chunk in chunks {
        if let (Some(last), Some(first)) = (legs.last(), chunk.first()) {
            if last.end_stop.id != first.start_stop.id {
                return Err(MapError::ChunkMismatch);
            }
        }
        legs.extend(chunk);
    }
    Ok(legs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stops(n: usize) -> Vec<Stop> {
        (0..n)
            .map(|i| {
                let mut stop = Stop::new(2024, format!("Stop {i}"), i as u32);
                stop.address = format!("{i} Main St");
                stop
            })
            .collect()
    }

    fn response(legs: usize, order: Vec<usize>) -> DirectionsResponse {
        serde_json::from_value(json!({
            "status": "OK",
            "routes": [{
                "legs": (0..legs).map(|i| json!({"distance": {"value": i}})).collect::<Vec<_>>(),
                "waypoint_order": order,
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_request_splits_origin_waypoints_destination() {
        let mut stops = stops(3);
        stops[1].lat_lng = "43.7,-72.2".to_string();
        let request = DirectionsRequest::for_stops(&stops).unwrap();
        assert_eq!(request.origin, "0 Main St");
        assert_eq!(request.waypoints, vec!["43.7,-72.2"]);
        assert_eq!(request.destination, "2 Main St");
        assert!(DirectionsRequest::for_stops(&stops[..1]).is_err());
    }

    #[test]
    fn test_chunk_ranges() {
        assert_eq!(chunk_ranges(1), Err(MapError::TooFewStops));
        assert_eq!(chunk_ranges(10).unwrap(), vec![0..10]);
        assert_eq!(chunk_ranges(11).unwrap(), vec![0..8, 7..11]);
        assert_eq!(chunk_ranges(20).unwrap(), vec![0..8, 7..15, 14..20]);
    }

    #[test]
    fn test_integrate_annotates_legs() {
        let stops = stops(3);
        let legs = integrate_legs(response(2, vec![0]), &stops).unwrap();
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].start_stop.name, "Stop 0");
        assert_eq!(legs[1].end_stop.name, "Stop 2");
        assert_eq!(legs[1].details["distance"]["value"], 1);
    }

    #[test]
    fn test_integrate_rejects_bad_responses() {
        let stops = stops(4);
        assert_eq!(
            integrate_legs(response(3, vec![1, 0]), &stops),
            Err(MapError::WaypointsOutOfOrder)
        );
        assert_eq!(
            integrate_legs(response(2, vec![0, 1]), &stops),
            Err(MapError::LegMismatch)
        );
        let empty: DirectionsResponse =
            serde_json::from_value(json!({"status": "ZERO_RESULTS", "routes": []})).unwrap();
        assert_eq!(
            integrate_legs(empty, &stops),
            Err(MapError::Status("ZERO_RESULTS".to_string()))
        );
        let two: DirectionsResponse =
            serde_json::from_value(json!({"routes": [{"legs": []}, {"legs": []}]})).unwrap();
        assert_eq!(integrate_legs(two, &stops), Err(MapError::RouteCount(2)));
    }

    #[test]
    fn test_join_legs_checks_continuity() {
        let stops = stops(11);
        let chunks: Vec<Vec<Leg>> = chunk_ranges(stops.len())
            .unwrap()
            .into_iter()
            .map(|range| {
                let chunk = &stops[range];
                let order = (0..chunk.len() - 2).collect();
                integrate_legs(response(chunk.len() - 1, order), chunk).unwrap()
            })
            .collect();
        let legs = join_legs(chunks.clone()).unwrap();
        assert_eq!(legs.len(), 10);
        assert_eq!(legs[9].end_stop.name, "Stop 10");

        let reversed: Vec<_> = chunks.into_iter().rev().collect();
        assert_eq!(join_legs(reversed), Err(MapError::ChunkMismatch));
    }
}
