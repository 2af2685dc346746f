pub use shared::{
    ApiError, AutoConfirmResult, BatchConfirmResult, Coordinate, CreateReport, CreateSegment,
    CreateTrip, CreateUser, PathSearchRequest, PathSearchResponse, Preference, Report,
    ReportAggregate, ReportCounts, RoadSegment, RouteBounds, RoutePreview, RouteResult, RouteTag,
    RoutesRequest, SegmentStatus, SegmentStatusUpdate, SegmentWarning, Stats, Trip, User,
    WarningKind,
};

/// A generated path before it is matched against stored segments.
#[derive(Debug, Clone)]
pub struct CandidatePath {
    pub route_id: String,
    pub label: String,
    /// Signed perpendicular offset of the via point, 0 for the direct path.
    pub offset_deg: f64,
    pub path: Vec<Coordinate>,
    pub distance_m: f64,
}

impl CandidatePath {
    pub fn is_direct(&self) -> bool {
        self.offset_deg.abs() < 1e-9
    }
}

/// A scored candidate, local to one search.
#[derive(Debug, Clone)]
pub struct RouteCandidate {
    pub route_id: String,
    pub label: String,
    pub path: Vec<Coordinate>,
    pub total_distance_m: f64,
    pub score: f64,
    pub quality_score: f64,
    pub pothole_count: usize,
    pub bad_road_length_m: f64,
    pub tags: Vec<RouteTag>,
    pub warnings: Vec<SegmentWarning>,
}
