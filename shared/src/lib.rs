use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use geojson::Geometry;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn interpolate(self, other: Self, t: f64) -> Self {
        Self {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: self.lon + (other.lon - self.lon) * t,
        }
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self {
            lat: (self.lat + other.lat) / 2.0,
            lon: (self.lon + other.lon) / 2.0,
        }
    }

    /// Finite and inside the WGS84 latitude/longitude ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preference {
    SafetyFirst,
    Shortest,
    #[default]
    Balanced,
}

impl Preference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preference::SafetyFirst => "safety_first",
            Preference::Shortest => "shortest",
            Preference::Balanced => "balanced",
        }
    }
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value '{0}'")]
pub struct UnknownVariant(pub String);

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    #[default]
    Optimal,
    Medium,
    Maintenance,
    Suboptimal,
}

impl SegmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentStatus::Optimal => "optimal",
            SegmentStatus::Medium => "medium",
            SegmentStatus::Maintenance => "maintenance",
            SegmentStatus::Suboptimal => "suboptimal",
        }
    }

    /// Statuses whose length counts as bad road when scoring a route.
    pub fn is_degraded(&self) -> bool {
        matches!(self, SegmentStatus::Maintenance | SegmentStatus::Suboptimal)
    }
}

impl fmt::Display for SegmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SegmentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "optimal" => Ok(SegmentStatus::Optimal),
            "medium" => Ok(SegmentStatus::Medium),
            "maintenance" => Ok(SegmentStatus::Maintenance),
            "suboptimal" => Ok(SegmentStatus::Suboptimal),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    Pothole,
    #[serde(rename = "Bad Road")]
    BadRoad,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentWarning {
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "type")]
    pub kind: WarningKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteTag {
    #[serde(rename = "Best Surface")]
    BestSurface,
    Bumpy,
    #[serde(rename = "Road Work")]
    RoadWork,
    Shortest,
    #[serde(rename = "Slightly Longer")]
    SlightlyLonger,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSearchRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    #[serde(default)]
    pub preferences: Preference,
    #[serde(default = "default_candidate_count")]
    pub n: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResult {
    pub route_id: String,
    /// "Direct" or "Alt {n}", by generation order.
    pub label: String,
    pub rank: usize,
    /// Meters, rounded to one decimal.
    pub total_distance: f64,
    /// 0-100, higher is better.
    pub road_quality_score: f64,
    pub tags: Vec<RouteTag>,
    /// Encoded polyline, precision 5.
    pub geometry: String,
    pub geometry_geojson: Geometry,
    pub segments_warning: Vec<SegmentWarning>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSearchResponse {
    pub routes: Vec<RouteResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    #[serde(default = "default_candidate_count")]
    pub n: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePreview {
    pub id: usize,
    pub label: String,
    pub distance_m: f64,
    pub duration_s: f64,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl RouteBounds {
    /// Smallest box holding every point, `None` for an empty path.
    pub fn from_path(path: &[Coordinate]) -> Option<Self> {
        let first = path.first()?;
        let init = Self {
            min_lat: first.lat,
            max_lat: first.lat,
            min_lon: first.lon,
            max_lon: first.lon,
        };
        Some(path.iter().fold(init, |b, c| Self {
            min_lat: b.min_lat.min(c.lat),
            max_lat: b.max_lat.max(c.lat),
            min_lon: b.min_lon.min(c.lon),
            max_lon: b.max_lon.max(c.lon),
        }))
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
            min_lon: self.min_lon.min(other.min_lon),
            max_lon: self.max_lon.max(other.max_lon),
        }
    }

    pub fn expand(self, margin_deg: f64) -> Self {
        Self {
            min_lat: self.min_lat - margin_deg,
            max_lat: self.max_lat + margin_deg,
            min_lon: self.min_lon - margin_deg,
            max_lon: self.max_lon + margin_deg,
        }
    }

    pub fn contains(&self, coord: Coordinate) -> bool {
        coord.lat >= self.min_lat
            && coord.lat <= self.max_lat
            && coord.lon >= self.min_lon
            && coord.lon <= self.max_lon
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadSegment {
    pub id: u64,
    pub user_id: u64,
    pub start: Coordinate,
    pub end: Coordinate,
    pub status: SegmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obstacle: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RoadSegment {
    pub fn midpoint(&self) -> Coordinate {
        self.start.midpoint(self.end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSegment {
    pub user_id: u64,
    pub start: Coordinate,
    pub end: Coordinate,
    #[serde(default)]
    pub status: SegmentStatus,
    #[serde(default)]
    pub obstacle: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentStatusUpdate {
    pub segment_id: u64,
    pub old_status: SegmentStatus,
    pub new_status: SegmentStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: u64,
    pub segment_id: u64,
    pub note: Option<String>,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateReport {
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportAggregate {
    pub segment_id: u64,
    pub reports_total: usize,
    pub reports_confirmed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfirmResult {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoConfirmResult {
    pub auto_confirmed: usize,
    #[serde(default)]
    pub report_ids: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: u64,
    pub user_id: u64,
    pub from: Coordinate,
    pub to: Coordinate,
    pub distance_m: f64,
    pub duration_s: f64,
    pub created_at: DateTime<Utc>,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTrip {
    pub user_id: u64,
    pub from: Coordinate,
    pub to: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_s: Option<f64>,
    #[serde(default)]
    pub use_osrm: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCounts {
    pub total: usize,
    pub confirmed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats {
    pub users: usize,
    pub segments: usize,
    pub reports: ReportCounts,
    pub trips: usize,
    pub total_distance_km: f64,
    pub segment_status_counts: BTreeMap<SegmentStatus, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}

pub fn default_candidate_count() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preference_defaults_to_balanced() {
        let req: PathSearchRequest = serde_json::from_str(
            r#"{"origin":{"lat":45.0,"lon":9.0},"destination":{"lat":45.1,"lon":9.1}}"#,
        )
        .unwrap();
        assert_eq!(req.preferences, Preference::Balanced);
        assert_eq!(req.n, 3);
    }

    #[test]
    fn unknown_preference_is_rejected() {
        let parsed = serde_json::from_str::<PathSearchRequest>(
            r#"{"origin":{"lat":45.0,"lon":9.0},"destination":{"lat":45.1,"lon":9.1},"preferences":"scenic"}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn unknown_status_error_names_the_value() {
        let err = "flooded".parse::<SegmentStatus>().unwrap_err();
        assert_eq!(err, UnknownVariant("flooded".to_string()));
        assert_eq!(err.to_string(), "unknown value 'flooded'");
        assert_eq!("maintenance".parse::<SegmentStatus>(), Ok(SegmentStatus::Maintenance));
    }

    #[test]
    fn warning_and_tag_wire_names() {
        let warning = SegmentWarning {
            lat: 1.0,
            lon: 2.0,
            kind: WarningKind::BadRoad,
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["type"], "Bad Road");

        let tags = serde_json::to_value([RouteTag::BestSurface, RouteTag::SlightlyLonger]).unwrap();
        assert_eq!(tags, serde_json::json!(["Best Surface", "Slightly Longer"]));
    }

    #[test]
    fn coordinate_validity() {
        assert!(Coordinate::new(45.0, 9.0).is_valid());
        assert!(!Coordinate::new(91.0, 9.0).is_valid());
        assert!(!Coordinate::new(45.0, -180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn bounds_cover_path() {
        let path = [Coordinate::new(1.0, 2.0), Coordinate::new(-1.0, 5.0)];
        let bounds = RouteBounds::from_path(&path).unwrap();
        assert_eq!(bounds.min_lat, -1.0);
        assert_eq!(bounds.max_lon, 5.0);
        assert!(bounds.contains(Coordinate::new(0.0, 3.0)));
        assert!(!bounds.contains(Coordinate::new(0.0, 5.1)));
        assert!(bounds.expand(0.2).contains(Coordinate::new(0.0, 5.1)));
        assert!(RouteBounds::from_path(&[]).is_none());
    }

    #[test]
    fn status_counts_serialize_with_lowercase_keys() {
        let mut counts = BTreeMap::new();
        counts.insert(SegmentStatus::Maintenance, 2usize);
        let json = serde_json::to_value(&counts).unwrap();
        assert_eq!(json["maintenance"], 2);
    }
}
