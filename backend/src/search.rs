use crate::candidates::{generate_candidates, CandidateSet, StepConfig};
use crate::error::SearchError;
use crate::matcher::{segments_near_path, DEFAULT_TOLERANCE_DEG};
use crate::models::{
    CandidatePath, Coordinate, PathSearchRequest, PathSearchResponse, Preference, RouteBounds,
    RouteCandidate, RoutePreview, RouteResult, RouteTag, RoutesRequest,
};
use crate::polyline::encode_default;
use crate::routing::{estimate_duration_s, line_string, round_to};
use crate::scoring::score_route;
use crate::store::SegmentRepository;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    /// Max degree distance between a segment midpoint and a route.
    pub tolerance_deg: f64,
    pub steps: StepConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tolerance_deg: DEFAULT_TOLERANCE_DEG,
            steps: StepConfig::default(),
        }
    }
}

pub fn validate_coordinate(name: &str, coord: Coordinate) -> Result<(), SearchError> {
    if coord.is_valid() {
        Ok(())
    } else {
        Err(SearchError::InvalidInput(format!(
            "{name} must be a finite coordinate with lat in [-90, 90] and lon in [-180, 180], got ({}, {})",
            coord.lat, coord.lon
        )))
    }
}

/// Generates, matches, scores and sorts candidates between two points.
///
/// Returned candidates are ordered by ascending score; equal scores keep
/// generation order. Fails only on invalid input or when the segment store
/// cannot be read.
pub fn rank_candidates(
    repo: &dyn SegmentRepository,
    origin: Coordinate,
    destination: Coordinate,
    preference: Preference,
    count: usize,
    config: &SearchConfig,
) -> Result<Vec<RouteCandidate>, SearchError> {
    validate_coordinate("origin", origin)?;
    validate_coordinate("destination", destination)?;

    let candidates =
        generate_candidates(origin, destination, count, CandidateSet::Search, config.steps)?;

    let bounds = candidates
        .iter()
        .filter_map(|c| RouteBounds::from_path(&c.path))
        .reduce(RouteBounds::union)
        .map(|b| b.expand(config.tolerance_deg));
    let segments = match bounds {
        Some(bounds) => repo.segments_within(&bounds)?,
        None => Vec::new(),
    };
    tracing::debug!(
        "scoring {} candidate(s) against {} nearby segment(s)",
        candidates.len(),
        segments.len()
    );

    let direct_distance_m = candidates
        .iter()
        .find(|c| c.is_direct())
        .map(|c| c.distance_m);

    let mut ranked: Vec<RouteCandidate> = candidates
        .into_iter()
        .map(|candidate| {
            let nearby = segments_near_path(&candidate.path, &segments, config.tolerance_deg);
            let breakdown = score_route(candidate.distance_m, &nearby, preference);
            let tags = route_tags(
                breakdown.tags.clone(),
                &candidate,
                breakdown.is_clean(),
                direct_distance_m,
            );

            RouteCandidate {
                route_id: candidate.route_id,
                label: candidate.label,
                total_distance_m: candidate.distance_m,
                path: candidate.path,
                score: breakdown.score,
                quality_score: breakdown.quality_score,
                pothole_count: breakdown.pothole_count,
                bad_road_length_m: breakdown.bad_road_length_m,
                tags,
                warnings: breakdown.warnings,
            }
        })
        .collect();

    ranked.sort_by(|a, b| a.score.total_cmp(&b.score));
    Ok(ranked)
}

/// Adds the distance-related tags on top of the surface tags.
fn route_tags(
    mut tags: Vec<RouteTag>,
    candidate: &CandidatePath,
    clean: bool,
    direct_distance_m: Option<f64>,
) -> Vec<RouteTag> {
    if candidate.is_direct() {
        // a clean direct route is advertised as "Best Surface" alone
        if !clean {
            tags.insert(0, RouteTag::Shortest);
        }
    } else if direct_distance_m.is_some_and(|direct| candidate.distance_m > direct) {
        tags.push(RouteTag::SlightlyLonger);
    }
    tags
}

/// Scored path search: ranked candidates with encoded geometry.
pub fn search_paths(
    repo: &dyn SegmentRepository,
    req: &PathSearchRequest,
    config: &SearchConfig,
) -> Result<PathSearchResponse, SearchError> {
    tracing::info!(
        "path search {:?} -> {:?} ({}, n={})",
        req.origin,
        req.destination,
        req.preferences,
        req.n
    );

    let ranked = rank_candidates(
        repo,
        req.origin,
        req.destination,
        req.preferences,
        req.n,
        config,
    )?;

    let routes: Vec<RouteResult> = ranked
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| RouteResult {
            route_id: candidate.route_id,
            label: candidate.label,
            rank: index + 1,
            total_distance: round_to(candidate.total_distance_m, 1),
            road_quality_score: round_to(candidate.quality_score, 1),
            tags: candidate.tags,
            geometry: encode_default(&candidate.path),
            geometry_geojson: line_string(&candidate.path),
            segments_warning: candidate.warnings,
        })
        .collect();

    if let Some(best) = routes.first() {
        tracing::info!(
            "best route {} of {}: {:.1} m, quality {:.1}",
            best.route_id,
            routes.len(),
            best.total_distance,
            best.road_quality_score
        );
    }

    Ok(PathSearchResponse { routes })
}

/// Unscored alternatives for quick display, in generation order.
pub fn preview_routes(
    req: &RoutesRequest,
    config: &SearchConfig,
) -> Result<Vec<RoutePreview>, SearchError> {
    validate_coordinate("origin", req.origin)?;
    validate_coordinate("destination", req.destination)?;

    let candidates = generate_candidates(
        req.origin,
        req.destination,
        req.n,
        CandidateSet::Preview,
        config.steps,
    )?;

    Ok(candidates
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| RoutePreview {
            id: index + 1,
            label: candidate.label,
            distance_m: round_to(candidate.distance_m, 1),
            duration_s: round_to(estimate_duration_s(candidate.distance_m), 1),
            geometry: line_string(&candidate.path),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateSegment, CreateUser, RoadSegment, SegmentStatus, WarningKind};
    use crate::polyline::{decode, DEFAULT_PRECISION};
    use crate::routing::path_distance_m;
    use crate::store::{MemoryStore, StoreError};

    const ORIGIN: Coordinate = Coordinate::new(45.478, 9.227);
    const DESTINATION: Coordinate = Coordinate::new(45.464, 9.190);

    struct UnavailableStore;

    impl SegmentRepository for UnavailableStore {
        fn segments(&self) -> Result<Vec<RoadSegment>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    fn request(preferences: Preference) -> PathSearchRequest {
        PathSearchRequest {
            origin: ORIGIN,
            destination: DESTINATION,
            preferences,
            n: 3,
        }
    }

    /// Store with a single maintenance pothole segment centred on the direct line.
    fn store_with_pothole_on_direct_path() -> MemoryStore {
        let store = MemoryStore::new();
        let user = store
            .create_user(CreateUser {
                username: "carol".into(),
            })
            .unwrap();
        let center = ORIGIN.interpolate(DESTINATION, 0.25);
        store
            .create_segment(CreateSegment {
                user_id: user.id,
                start: Coordinate::new(center.lat + 0.0001, center.lon + 0.0002),
                end: Coordinate::new(center.lat - 0.0001, center.lon - 0.0002),
                status: SegmentStatus::Maintenance,
                obstacle: Some("pothole".into()),
            })
            .unwrap();
        store
    }

    fn rank(store: &dyn SegmentRepository, preference: Preference) -> Vec<RouteCandidate> {
        rank_candidates(
            store,
            ORIGIN,
            DESTINATION,
            preference,
            3,
            &SearchConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn clean_area_scores_equal_distances() {
        let store = MemoryStore::new();
        let ranked = rank(&store, Preference::Balanced);
        assert_eq!(ranked.len(), 3);
        for candidate in &ranked {
            assert!(candidate.tags.contains(&RouteTag::BestSurface));
            assert!(candidate.warnings.is_empty());
            assert_eq!(candidate.score, candidate.total_distance_m);
            assert_eq!(candidate.quality_score, 100.0);
        }
        // clean direct route wins and carries only "Best Surface"
        assert_eq!(ranked[0].route_id, "A");
        assert_eq!(ranked[0].tags, vec![RouteTag::BestSurface]);
        for detour in &ranked[1..] {
            assert_eq!(
                detour.tags,
                vec![RouteTag::BestSurface, RouteTag::SlightlyLonger]
            );
        }
    }

    #[test]
    fn pothole_on_direct_path_is_reported_once() {
        let store = store_with_pothole_on_direct_path();
        let ranked = rank(&store, Preference::Balanced);
        let direct = ranked.iter().find(|c| c.route_id == "A").unwrap();

        assert_eq!(direct.pothole_count, 1);
        assert_eq!(direct.warnings.len(), 1);
        assert_eq!(direct.warnings[0].kind, WarningKind::Pothole);
        assert!(direct.score > direct.total_distance_m);
        assert_eq!(direct.tags[0], RouteTag::Shortest);
        assert!(direct.tags.contains(&RouteTag::Bumpy));

        for detour in ranked.iter().filter(|c| c.route_id != "A") {
            assert!(detour.warnings.is_empty());
            assert_eq!(detour.score, detour.total_distance_m);
        }
    }

    #[test]
    fn results_are_sorted_by_score() {
        let store = store_with_pothole_on_direct_path();
        for preference in [
            Preference::SafetyFirst,
            Preference::Balanced,
            Preference::Shortest,
        ] {
            let ranked = rank(&store, preference);
            for pair in ranked.windows(2) {
                assert!(pair[0].score <= pair[1].score);
            }
        }
        // the 800 m pothole cost pushes the direct route behind a detour
        let safety = rank(&store, Preference::SafetyFirst);
        assert_ne!(safety[0].route_id, "A");
    }

    #[test]
    fn safety_first_never_cheaper_than_shortest() {
        let store = store_with_pothole_on_direct_path();
        let safety = rank(&store, Preference::SafetyFirst);
        let shortest = rank(&store, Preference::Shortest);
        for candidate in &safety {
            let other = shortest
                .iter()
                .find(|c| c.route_id == candidate.route_id)
                .unwrap();
            assert!(candidate.score >= other.score);
        }
    }

    #[test]
    fn distances_match_paths() {
        let store = MemoryStore::new();
        for candidate in rank(&store, Preference::Balanced) {
            let summed = path_distance_m(&candidate.path);
            assert!((candidate.total_distance_m - summed).abs() <= summed * 1e-6);
        }
    }

    #[test]
    fn response_ranks_and_geometry() {
        let store = store_with_pothole_on_direct_path();
        let response =
            search_paths(&store, &request(Preference::Balanced), &SearchConfig::default())
                .unwrap();

        let ranks: Vec<usize> = response.routes.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);

        let direct = response.routes.iter().find(|r| r.route_id == "A").unwrap();
        assert_eq!(direct.label, "Direct");
        let mut labels: Vec<&str> = response.routes.iter().map(|r| r.label.as_str()).collect();
        labels.sort_unstable();
        assert_eq!(labels, vec!["Alt 1", "Alt 2", "Direct"]);

        for route in &response.routes {
            let decoded = decode(&route.geometry, DEFAULT_PRECISION).unwrap();
            assert!((decoded[0].lat - ORIGIN.lat).abs() < 1e-9);
            assert!((decoded.last().unwrap().lon - DESTINATION.lon).abs() < 1e-5);
            assert!((0.0..=100.0).contains(&route.road_quality_score));
        }
    }

    #[test]
    fn invalid_coordinates_are_rejected() {
        let store = MemoryStore::new();
        let mut req = request(Preference::Balanced);
        req.origin.lat = 120.0;
        let result = search_paths(&store, &req, &SearchConfig::default());
        assert!(matches!(result, Err(SearchError::InvalidInput(_))));

        req.origin = Coordinate::new(f64::NAN, 0.0);
        let result = search_paths(&store, &req, &SearchConfig::default());
        assert!(matches!(result, Err(SearchError::InvalidInput(_))));
    }

    #[test]
    fn store_failure_fails_the_search() {
        let result = search_paths(
            &UnavailableStore,
            &request(Preference::Balanced),
            &SearchConfig::default(),
        );
        assert!(matches!(
            result,
            Err(SearchError::Store(StoreError::Unavailable(_)))
        ));
    }

    #[test]
    fn same_origin_and_destination_is_not_an_error() {
        let store = MemoryStore::new();
        let ranked = rank_candidates(
            &store,
            ORIGIN,
            ORIGIN,
            Preference::Balanced,
            3,
            &SearchConfig::default(),
        )
        .unwrap();
        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|c| c.quality_score == 100.0));
    }

    #[test]
    fn preview_lists_requested_count() {
        let req = RoutesRequest {
            origin: ORIGIN,
            destination: DESTINATION,
            n: 5,
        };
        let previews = preview_routes(&req, &SearchConfig::default()).unwrap();
        let labels: Vec<&str> = previews.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Direct", "Alt 1", "Alt 2", "Alt 3", "Alt 4"]);
        assert!(previews[0].duration_s > 0.0);
        assert!(previews[1].distance_m > previews[0].distance_m);

        let too_many = RoutesRequest { n: 6, ..req };
        assert!(preview_routes(&too_many, &SearchConfig::default()).is_err());
    }
}
