//! HTTP handlers. Each returns `ApiResult`, errors become `(status, {message})`.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{api_error, ApiResult};
use crate::models::{
    AutoConfirmResult, BatchConfirmResult, CreateReport, CreateSegment, CreateTrip, CreateUser,
    PathSearchRequest, PathSearchResponse, Report, ReportAggregate, RoadSegment, RoutePreview,
    RoutesRequest, SegmentStatusUpdate, Stats, Trip, User,
};
use crate::osrm::{route_or_fallback, straight_line_route, TripRoute};
use crate::routing::{estimate_duration_s, path_distance_m, path_from_line_string};
use crate::search::{preview_routes, search_paths, validate_coordinate};
use crate::store::{SegmentRepository, TripDraft};
use crate::AppState;

const DEFAULT_AUTO_CONFIRM_THRESHOLD: usize = 2;

/// Unwraps a JSON body, reporting any rejection as 400.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| api_error(StatusCode::BAD_REQUEST, rejection.body_text()))
}

/// GET / - Health check
pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true, "message": "bike path backend running" }))
}

/// POST /api/path/search - Scored route search
pub async fn search_path(
    State(state): State<AppState>,
    payload: Result<Json<PathSearchRequest>, JsonRejection>,
) -> ApiResult<Json<PathSearchResponse>> {
    let req = json_body(payload)?;
    let response = search_paths(state.store.as_ref(), &req, &state.search)?;
    Ok(Json(response))
}

/// POST /api/routes - Unscored candidate preview
pub async fn routes_preview(
    State(state): State<AppState>,
    payload: Result<Json<RoutesRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<RoutePreview>>> {
    let req = json_body(payload)?;
    Ok(Json(preview_routes(&req, &state.search)?))
}

// ---- users ----

/// POST /api/users - Create a user, or return the existing one with that name
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let req = json_body(payload)?;
    Ok(Json(state.store.create_user(req)?))
}

/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<User>> {
    Json(state.store.users())
}

// ---- segments ----

/// POST /api/segments - Record a road segment condition
pub async fn create_segment(
    State(state): State<AppState>,
    payload: Result<Json<CreateSegment>, JsonRejection>,
) -> ApiResult<Json<RoadSegment>> {
    let req = json_body(payload)?;
    Ok(Json(state.store.create_segment(req)?))
}

/// GET /api/segments
pub async fn list_segments(State(state): State<AppState>) -> ApiResult<Json<Vec<RoadSegment>>> {
    Ok(Json(state.store.segments()?))
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub new_status: String,
}

/// POST /api/segments/:id/status?new_status= - Change a segment status
/// (also served at /api/segments/:id/apply-detection)
pub async fn update_segment_status(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<SegmentStatusUpdate>> {
    Ok(Json(state.store.update_segment_status(id, &query.new_status)?))
}

// ---- reports ----

/// POST /api/segments/:id/reports - File a condition report
///
/// An empty body files a report without a note; anything else must be a
/// valid `CreateReport` document.
pub async fn create_report(
    State(state): State<AppState>,
    Path(segment_id): Path<u64>,
    body: Bytes,
) -> ApiResult<Json<Report>> {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        CreateReport::default()
    } else {
        json_body(Json::from_bytes(&body))?
    };
    Ok(Json(state.store.create_report(segment_id, req)?))
}

/// GET /api/segments/:id/reports
pub async fn list_reports(
    State(state): State<AppState>,
    Path(segment_id): Path<u64>,
) -> ApiResult<Json<Vec<Report>>> {
    Ok(Json(state.store.reports_for(segment_id)?))
}

/// GET /api/segments/:id/aggregate - Report totals for a segment
pub async fn segment_aggregate(
    State(state): State<AppState>,
    Path(segment_id): Path<u64>,
) -> ApiResult<Json<ReportAggregate>> {
    Ok(Json(state.store.aggregate(segment_id)?))
}

#[derive(Debug, Deserialize)]
pub struct ThresholdQuery {
    pub threshold: Option<usize>,
}

/// POST /api/segments/:id/auto-confirm-reports?threshold=
pub async fn auto_confirm_reports(
    State(state): State<AppState>,
    Path(segment_id): Path<u64>,
    Query(query): Query<ThresholdQuery>,
) -> ApiResult<Json<AutoConfirmResult>> {
    let threshold = query.threshold.unwrap_or(DEFAULT_AUTO_CONFIRM_THRESHOLD);
    Ok(Json(state.store.auto_confirm(segment_id, threshold)?))
}

/// POST /api/reports/:id/confirm
pub async fn confirm_report(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<Report>> {
    Ok(Json(state.store.confirm_report(id)?))
}

/// POST /api/reports/batch-confirm - Body is a bare id array; unknown ids do not fail the batch
pub async fn batch_confirm_reports(
    State(state): State<AppState>,
    payload: Result<Json<Vec<u64>>, JsonRejection>,
) -> ApiResult<Json<Vec<BatchConfirmResult>>> {
    let report_ids = json_body(payload)?;
    Ok(Json(state.store.batch_confirm(&report_ids)))
}

// ---- trips ----

#[derive(Debug, Default, Deserialize)]
pub struct TripQuery {
    pub use_osrm: Option<bool>,
}

/// Geometry, distance and duration for a new trip.
///
/// Caller-supplied values win; missing ones come from the supplied geometry,
/// an OSRM lookup when requested, or a straight line.
async fn resolve_trip_route(
    state: &AppState,
    req: &CreateTrip,
    use_osrm: bool,
) -> ApiResult<TripRoute> {
    for (name, value) in [("distance_m", req.distance_m), ("duration_s", req.duration_s)] {
        if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                format!("{name} must be a non-negative number"),
            ));
        }
    }

    let mut route = match &req.geometry {
        Some(geometry) => {
            let path = path_from_line_string(geometry).ok_or_else(|| {
                api_error(StatusCode::BAD_REQUEST, "geometry must be a GeoJSON LineString")
            })?;
            let distance_m = path_distance_m(&path);
            TripRoute {
                geometry: geometry.clone(),
                distance_m,
                duration_s: estimate_duration_s(distance_m),
            }
        }
        None if use_osrm => route_or_fallback(state.osrm.as_deref(), req.from, req.to).await,
        None => straight_line_route(req.from, req.to),
    };

    if let Some(distance_m) = req.distance_m {
        route.distance_m = distance_m;
        if req.duration_s.is_none() {
            route.duration_s = estimate_duration_s(distance_m);
        }
    }
    if let Some(duration_s) = req.duration_s {
        route.duration_s = duration_s;
    }
    Ok(route)
}

/// POST /api/trips?use_osrm= - Store a ridden trip
pub async fn create_trip(
    State(state): State<AppState>,
    Query(query): Query<TripQuery>,
    payload: Result<Json<CreateTrip>, JsonRejection>,
) -> ApiResult<Json<Trip>> {
    let req = json_body(payload)?;
    validate_coordinate("from", req.from)?;
    validate_coordinate("to", req.to)?;
    state.store.ensure_user(req.user_id)?;

    let use_osrm = query.use_osrm.unwrap_or(false) || req.use_osrm;
    let route = resolve_trip_route(&state, &req, use_osrm).await?;

    let trip = state.store.insert_trip(TripDraft {
        user_id: req.user_id,
        from: req.from,
        to: req.to,
        geometry: route.geometry,
        distance_m: route.distance_m,
        duration_s: route.duration_s,
    })?;
    tracing::info!(
        "trip {} stored for user {}: {:.1} m",
        trip.id,
        trip.user_id,
        trip.distance_m
    );
    Ok(Json(trip))
}

#[derive(Debug, Deserialize)]
pub struct TripListQuery {
    pub user_id: Option<u64>,
}

/// GET /api/trips?user_id= - Newest first
pub async fn list_trips(
    State(state): State<AppState>,
    Query(query): Query<TripListQuery>,
) -> Json<Vec<Trip>> {
    Json(state.store.trips(query.user_id))
}

/// GET /api/trips/:id
pub async fn get_trip(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<Trip>> {
    Ok(Json(state.store.trip(id)?))
}

/// DELETE /api/trips/:id
pub async fn delete_trip(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<Value>> {
    state.store.delete_trip(id)?;
    Ok(Json(json!({ "ok": true, "deleted": id })))
}

// ---- stats ----

/// GET /api/stats - Global counters
pub async fn stats(State(state): State<AppState>) -> Json<Stats> {
    Json(state.store.stats())
}
