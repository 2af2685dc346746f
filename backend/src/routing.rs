use geojson::{Geometry, Value};

use crate::error::SearchError;
use crate::models::Coordinate;

const EARTH_RADIUS_M: f64 = 6_371_000.0;
const CRUISING_SPEED_MPS: f64 = 11.0;

/// Great-circle distance in meters.
pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// `steps + 1` points linearly spaced in (lat, lon) space, both endpoints included.
pub fn interpolate(
    start: Coordinate,
    end: Coordinate,
    steps: usize,
) -> Result<Vec<Coordinate>, SearchError> {
    if steps == 0 {
        return Err(SearchError::InvalidInput(
            "interpolation needs at least one step".to_string(),
        ));
    }

    let mut path = Vec::with_capacity(steps + 1);
    for i in 0..steps {
        let t = i as f64 / steps as f64;
        path.push(start.interpolate(end, t));
    }
    path.push(end);
    Ok(path)
}

/// Planar distance in degrees from `p` to the segment `a`-`b`.
pub fn point_to_segment_distance(p: Coordinate, a: Coordinate, b: Coordinate) -> f64 {
    let abx = b.lon - a.lon;
    let aby = b.lat - a.lat;
    let apx = p.lon - a.lon;
    let apy = p.lat - a.lat;
    let ab_sq = abx * abx + aby * aby;
    if ab_sq == 0.0 {
        return (apx * apx + apy * apy).sqrt();
    }

    let t = ((apx * abx + apy * aby) / ab_sq).clamp(0.0, 1.0);
    let proj_x = a.lon + t * abx;
    let proj_y = a.lat + t * aby;
    ((p.lon - proj_x).powi(2) + (p.lat - proj_y).powi(2)).sqrt()
}

pub fn path_distance_m(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|w| haversine_m(w[0], w[1])).sum()
}

/// Unit vector perpendicular to `start -> end` in (lat, lon) space.
///
/// When both points coincide the norm falls back to 1, so the result is the
/// zero vector and every offset collapses onto the midpoint.
pub fn perpendicular_unit(start: Coordinate, end: Coordinate) -> Coordinate {
    let dlat = end.lat - start.lat;
    let dlon = end.lon - start.lon;
    let norm = (dlat * dlat + dlon * dlon).sqrt();
    let norm = if norm > 0.0 { norm } else { 1.0 };
    Coordinate {
        lat: -dlon / norm,
        lon: dlat / norm,
    }
}

pub fn estimate_duration_s(distance_m: f64) -> f64 {
    distance_m / CRUISING_SPEED_MPS
}

/// GeoJSON LineString with `[lon, lat]` positions.
pub fn line_string(path: &[Coordinate]) -> Geometry {
    Geometry::new(Value::LineString(
        path.iter().map(|c| vec![c.lon, c.lat]).collect(),
    ))
}

/// Inverse of [`line_string`]; `None` for other geometry types or short positions.
pub fn path_from_line_string(geometry: &Geometry) -> Option<Vec<Coordinate>> {
    match &geometry.value {
        Value::LineString(positions) => positions
            .iter()
            .map(|p| match p.as_slice() {
                [lon, lat, ..] => Some(Coordinate {
                    lat: *lat,
                    lon: *lon,
                }),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
