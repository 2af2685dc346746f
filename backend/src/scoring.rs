//! Road-quality scoring of a single candidate route.
//!
//! The ranking score is the route length in meters plus a penalty expressed
//! in meters-equivalent. The penalty is driven by two hazard signals taken
//! from the nearby stored segments:
//!
//! ```text
//! pothole_count      = segments whose obstacle mentions "pothole"
//! bad_road_length_m  = summed length of maintenance/suboptimal segments
//!
//! penalty = pothole_count * per_pothole + bad_road_length_m * per_bad_meter
//! score   = distance_m + penalty                     (lower is better)
//! quality = clamp(100 - penalty / (2 * distance_m) * 100, 0, 100)
//! ```

use crate::models::{
    Coordinate, Preference, RoadSegment, RouteTag, SegmentStatus, SegmentWarning, WarningKind,
};
use crate::routing::haversine_m;

/// Two warnings closer than this (degrees, per axis) mark the same spot.
const WARNING_EPSILON_DEG: f64 = 0.0001;
/// Bad road beyond this many meters earns the "Road Work" tag.
const ROAD_WORK_THRESHOLD_M: f64 = 100.0;
/// Quality normalisation: a penalty of twice the route length scores 0.
const MAX_PENALTY_FACTOR: f64 = 2.0;

/// Per-hazard cost, in meters-equivalent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenaltyWeights {
    pub per_pothole_m: f64,
    pub per_bad_road_m: f64,
}

impl PenaltyWeights {
    pub fn for_preference(preference: Preference) -> Self {
        match preference {
            Preference::SafetyFirst => Self {
                per_pothole_m: 800.0,
                per_bad_road_m: 3.0,
            },
            Preference::Shortest => Self {
                per_pothole_m: 100.0,
                per_bad_road_m: 0.5,
            },
            Preference::Balanced => Self {
                per_pothole_m: 500.0,
                per_bad_road_m: 2.0,
            },
        }
    }

    pub fn penalty(&self, pothole_count: usize, bad_road_length_m: f64) -> f64 {
        pothole_count as f64 * self.per_pothole_m + bad_road_length_m * self.per_bad_road_m
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub score: f64,
    pub quality_score: f64,
    pub pothole_count: usize,
    pub bad_road_length_m: f64,
    pub tags: Vec<RouteTag>,
    pub warnings: Vec<SegmentWarning>,
}

impl ScoreBreakdown {
    pub fn is_clean(&self) -> bool {
        self.pothole_count == 0 && self.bad_road_length_m == 0.0
    }
}

fn mentions_pothole(obstacle: Option<&str>) -> bool {
    obstacle.is_some_and(|text| text.to_lowercase().contains("pothole"))
}

fn warning_at(point: Coordinate, kind: WarningKind) -> SegmentWarning {
    SegmentWarning {
        lat: point.lat,
        lon: point.lon,
        kind,
    }
}

fn pothole_already_flagged(warnings: &[SegmentWarning], point: Coordinate) -> bool {
    warnings.iter().any(|w| {
        w.kind == WarningKind::Pothole
            && (w.lat - point.lat).abs() < WARNING_EPSILON_DEG
            && (w.lon - point.lon).abs() < WARNING_EPSILON_DEG
    })
}

pub fn quality_score(penalty: f64, distance_m: f64) -> f64 {
    let max_penalty = distance_m * MAX_PENALTY_FACTOR;
    if max_penalty > 0.0 {
        (100.0 - (penalty / max_penalty) * 100.0).clamp(0.0, 100.0)
    } else {
        100.0
    }
}

/// Scores one candidate from its length and the segments matched to it.
pub fn score_route(
    distance_m: f64,
    nearby: &[RoadSegment],
    preference: Preference,
) -> ScoreBreakdown {
    let mut pothole_count = 0;
    let mut bad_road_length_m = 0.0;
    let mut warnings = Vec::new();

    for segment in nearby {
        let midpoint = segment.midpoint();

        if mentions_pothole(segment.obstacle.as_deref()) {
            pothole_count += 1;
            warnings.push(warning_at(midpoint, WarningKind::Pothole));
        }

        if segment.status.is_degraded() {
            bad_road_length_m += haversine_m(segment.start, segment.end);
            if segment.status == SegmentStatus::Maintenance
                && !pothole_already_flagged(&warnings, midpoint)
            {
                warnings.push(warning_at(midpoint, WarningKind::BadRoad));
            }
        }
    }

    let penalty =
        PenaltyWeights::for_preference(preference).penalty(pothole_count, bad_road_length_m);

    let mut tags = Vec::new();
    if pothole_count == 0 && bad_road_length_m == 0.0 {
        tags.push(RouteTag::BestSurface);
    } else if pothole_count > 0 {
        tags.push(RouteTag::Bumpy);
    }
    if bad_road_length_m > ROAD_WORK_THRESHOLD_M {
        tags.push(RouteTag::RoadWork);
    }

    ScoreBreakdown {
        score: distance_m + penalty,
        quality_score: quality_score(penalty, distance_m),
        pothole_count,
        bad_road_length_m,
        tags,
        warnings,
    }
}
