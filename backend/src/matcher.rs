use rayon::prelude::*;

use crate::models::{Coordinate, RoadSegment};
use crate::routing::point_to_segment_distance;

/// Roughly 200 m at the equator.
pub const DEFAULT_TOLERANCE_DEG: f64 = 0.002;

/// Smallest planar distance (degrees) from `point` to any leg of `path`.
///
/// A single-point path degenerates to the distance to that point; an empty
/// path is infinitely far away.
pub fn distance_to_path(point: Coordinate, path: &[Coordinate]) -> f64 {
    match path {
        [] => f64::INFINITY,
        [only] => point_to_segment_distance(point, *only, *only),
        _ => path
            .windows(2)
            .map(|leg| point_to_segment_distance(point, leg[0], leg[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Stored segments whose midpoint lies strictly within `tolerance_deg` of the path.
///
/// Linear scan over segments × path legs; input order is preserved.
pub fn segments_near_path(
    path: &[Coordinate],
    segments: &[RoadSegment],
    tolerance_deg: f64,
) -> Vec<RoadSegment> {
    let nearby: Vec<RoadSegment> = segments
        .par_iter()
        .filter(|segment| distance_to_path(segment.midpoint(), path) < tolerance_deg)
        .cloned()
        .collect();

    tracing::debug!(
        "matched {}/{} segments within {tolerance_deg}° of a {}-point path",
        nearby.len(),
        segments.len(),
        path.len()
    );
    nearby
}
