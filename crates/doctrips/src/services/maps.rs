//! Driving directions for bus routes.

use std::time::Duration;

use async_trait::async_trait;

use doctrips_core::transport::{
    chunk_ranges, integrate_legs, join_legs, DirectionsRequest, DirectionsResponse, Leg,
    MapError, Stop,
};

/// A directions service answering one request at a time.
#[async_trait]
pub trait DirectionsClient: Send + Sync {
    async fn fetch(&self, request: &DirectionsRequest) -> Result<DirectionsResponse, MapError>;
}

/// The Google directions JSON API.
pub struct MapsApi {
    http: reqwest::Client,
    url: String,
    key: String,
}

impl MapsApi {
    pub fn new(url: impl Into<String>, key: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client for directions");
                reqwest::Client::new()
            });
        Self {
            http,
            url: url.into(),
            key: key.into(),
        }
    }
}

#[async_trait]
impl DirectionsClient for MapsApi {
    async fn fetch(&self, request: &DirectionsRequest) -> Result<DirectionsResponse, MapError> {
        let http_err = |e: reqwest::Error| MapError::Http(e.to_string());
        self.http
            .get(&self.url)
            .query(&request.query(&self.key))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(http_err)?
            .json()
            .await
            .map_err(http_err)
    }
}

/// Directions through every stop in order, split into as many calls as the
/// waypoint limit requires.
pub async fn route_directions(
    client: &dyn DirectionsClient,
    stops: &[Stop],
) -> Result<Vec<Leg>, MapError> {
    let mut chunks = Vec::new();
    for range in chunk_ranges(stops.len())? {
        let chunk = &stops[range];
        let request = DirectionsRequest::for_stops(chunk)?;
        let response = client.fetch(&request).await?;
        chunks.push(integrate_legs(response, chunk)?);
    }
    join_legs(chunks)
}


#[cfg(test)]
mod tests {
    use super::fake::StraightLine;
    use super::*;

    struct Failing;

    #[async_trait]
    impl DirectionsClient for Failing {
        async fn fetch(&self, _: &DirectionsRequest) -> Result<DirectionsResponse, MapError> {
            Err(MapError::Status("OVER_QUERY_LIMIT".to_string()))
        }
    }

    fn stops(n: usize) -> Vec<Stop> {
        (0..n)
            .map(|i| {
                let mut stop = Stop::new(2024, format!("Stop {i}"), i as u32);
                stop.address = format!("{i} Main St");
                stop
            })
            .collect()
    }

    #[tokio::test]
    async fn test_long_routes_are_joined() {
        let stops = stops(20);
        let legs = route_directions(&StraightLine, &stops).await.unwrap();
        assert_eq!(legs.len(), 19);
        assert_eq!(legs[0].start_stop.id, stops[0].id);
        assert_eq!(legs[18].end_stop.id, stops[19].id);
        for pair in legs.windows(2) {
            assert_eq!(pair[0].end_stop.id, pair[1].start_stop.id);
        }
    }

    #[tokio::test]
    async fn test_errors_are_not_retried() {
        let result = route_directions(&Failing, &stops(3)).await;
        assert_eq!(result, Err(MapError::Status("OVER_QUERY_LIMIT".to_string())));
        assert_eq!(
            route_directions(&StraightLine, &stops(1)).await,
            Err(MapError::TooFewStops)
        );
    }
}
