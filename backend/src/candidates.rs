use crate::error::SearchError;
use crate::models::{CandidatePath, Coordinate};
use crate::routing::{interpolate, path_distance_m, perpendicular_unit};

pub const MAX_CANDIDATES: usize = 5;

const SEARCH_OFFSETS: [f64; MAX_CANDIDATES] = [0.0, 0.012, -0.012, 0.018, -0.018];
const PREVIEW_OFFSETS: [f64; MAX_CANDIDATES] = [0.0, 0.010, -0.010, 0.018, -0.018];
const ROUTE_LETTERS: [&str; MAX_CANDIDATES] = ["A", "B", "C", "D", "E"];

/// Interpolation density of generated paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepConfig {
    pub direct_steps: usize,
    /// Steps per leg on either side of the via point.
    pub via_steps: usize,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            direct_steps: 32,
            via_steps: 18,
        }
    }
}

/// Which offset table and naming scheme to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSet {
    /// Scored search: lettered routes, ±0.012° then ±0.018° detours.
    Search,
    /// Unscored preview: numbered routes, ±0.010° then ±0.018° detours.
    Preview,
}

impl CandidateSet {
    fn offsets(self) -> &'static [f64; MAX_CANDIDATES] {
        match self {
            CandidateSet::Search => &SEARCH_OFFSETS,
            CandidateSet::Preview => &PREVIEW_OFFSETS,
        }
    }

    fn route_id(self, index: usize) -> String {
        match self {
            CandidateSet::Search => ROUTE_LETTERS[index].to_string(),
            CandidateSet::Preview => (index + 1).to_string(),
        }
    }
}

fn label(index: usize) -> String {
    if index == 0 {
        "Direct".to_string()
    } else {
        format!("Alt {index}")
    }
}

/// Builds `count` alternative paths from `origin` to `destination`.
///
/// The first path is the straight interpolation; every other one bends
/// through a via point pushed off the midpoint along the perpendicular of
/// the direct line. Output is fully determined by the inputs.
pub fn generate_candidates(
    origin: Coordinate,
    destination: Coordinate,
    count: usize,
    set: CandidateSet,
    steps: StepConfig,
) -> Result<Vec<CandidatePath>, SearchError> {
    if !(1..=MAX_CANDIDATES).contains(&count) {
        return Err(SearchError::InvalidInput(format!(
            "candidate count must be between 1 and {MAX_CANDIDATES}, got {count}"
        )));
    }

    let midpoint = origin.midpoint(destination);
    let perp = perpendicular_unit(origin, destination);

    set.offsets()
        .iter()
        .take(count)
        .enumerate()
        .map(|(index, &offset_deg)| {
            let path = if offset_deg.abs() < 1e-9 {
                interpolate(origin, destination, steps.direct_steps)?
            } else {
                let via = Coordinate {
                    lat: midpoint.lat + perp.lat * offset_deg,
                    lon: midpoint.lon + perp.lon * offset_deg,
                };
                via_path(origin, destination, via, steps.via_steps)?
            };

            Ok::<_, SearchError>(CandidatePath {
                route_id: set.route_id(index),
                label: label(index),
                offset_deg,
                distance_m: path_distance_m(&path),
                path,
            })
        })
        .collect()
}

/// `origin -> via -> destination`, the via point appearing once.
pub fn via_path(
    origin: Coordinate,
    destination: Coordinate,
    via: Coordinate,
    steps_each: usize,
) -> Result<Vec<Coordinate>, SearchError> {
    let mut path = interpolate(origin, via, steps_each)?;
    let second_leg = interpolate(via, destination, steps_each)?;
    path.extend_from_slice(&second_leg[1..]);
    Ok(path)
}
