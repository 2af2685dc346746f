//! Optional bike routing through an OSRM server, used to give stored trips a
//! realistic geometry. Any failure falls back to a straight line.

use std::time::Duration;

use geojson::Geometry;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::models::Coordinate;
use crate::routing::{
    estimate_duration_s, interpolate, line_string, path_distance_m, path_from_line_string,
};

/// Interpolation density of the straight-line fallback.
const FALLBACK_STEPS: usize = 30;

#[derive(Debug, Error)]
pub enum OsrmError {
    #[error("osrm request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("osrm returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("osrm response carried no route")]
    NoRoute,
    #[error("osrm route geometry is not a line string")]
    BadGeometry,
}

/// Geometry, distance and duration of one trip leg.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRoute {
    pub geometry: Geometry,
    pub distance_m: f64,
    pub duration_s: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: Geometry,
    distance: f64,
    duration: f64,
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    client: Client,
    base_url: String,
}

impl OsrmClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, OsrmError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn route_url(&self, from: Coordinate, to: Coordinate) -> String {
        format!(
            "{}/route/v1/bike/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url, from.lon, from.lat, to.lon, to.lat
        )
    }

    /// First OSRM route between two points.
    pub async fn route(&self, from: Coordinate, to: Coordinate) -> Result<TripRoute, OsrmError> {
        let response = self.client.get(self.route_url(from, to)).send().await?;
        if !response.status().is_success() {
            return Err(OsrmError::Status(response.status()));
        }
        let body: OsrmResponse = response.json().await?;
        let route = body.routes.into_iter().next().ok_or(OsrmError::NoRoute)?;
        if path_from_line_string(&route.geometry).is_none() {
            return Err(OsrmError::BadGeometry);
        }

        Ok(TripRoute {
            geometry: route.geometry,
            distance_m: route.distance,
            duration_s: route.duration,
        })
    }
}

/// Straight-line leg; distance is summed along the interpolated points.
pub fn straight_line_route(from: Coordinate, to: Coordinate) -> TripRoute {
    // FALLBACK_STEPS is non-zero, interpolation cannot fail
    let path = interpolate(from, to, FALLBACK_STEPS).unwrap_or_else(|_| vec![from, to]);
    let distance_m = path_distance_m(&path);
    TripRoute {
        geometry: line_string(&path),
        distance_m,
        duration_s: estimate_duration_s(distance_m),
    }
}

/// OSRM route when a client is configured and answers, straight line otherwise.
pub async fn route_or_fallback(
    client: Option<&OsrmClient>,
    from: Coordinate,
    to: Coordinate,
) -> TripRoute {
    let Some(client) = client else {
        return straight_line_route(from, to);
    };

    match client.route(from, to).await {
        Ok(route) => {
            tracing::debug!("osrm route {:.1} m from {}", route.distance_m, client.base_url());
            route
        }
        Err(err) => {
            tracing::warn!("osrm lookup failed, using straight line: {err}");
            straight_line_route(from, to)
        }
    }
}
