//! In-memory records for users, road segments, condition reports and trips.
//!
//! The search pipeline only sees the read side through [`SegmentRepository`];
//! everything else is used by the HTTP handlers.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use geojson::Geometry;

use crate::models::{
    AutoConfirmResult, BatchConfirmResult, Coordinate, CreateReport, CreateSegment, CreateUser,
    Report, ReportAggregate, ReportCounts, RoadSegment, RouteBounds, SegmentStatus,
    SegmentStatusUpdate, Stats, Trip, User,
};
use crate::routing::round_to;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u64 },
    #[error("user {0} not found")]
    UnknownUser(u64),
    #[error("invalid segment status '{0}'")]
    InvalidStatus(String),
    #[error("invalid record: {0}")]
    InvalidInput(String),
    #[error("segment store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to stored road segments.
///
/// Implementations may serve a stale snapshot; a search never writes back.
pub trait SegmentRepository: Send + Sync {
    fn segments(&self) -> Result<Vec<RoadSegment>, StoreError>;

    /// Segments whose midpoint falls inside `bounds`.
    fn segments_within(&self, bounds: &RouteBounds) -> Result<Vec<RoadSegment>, StoreError> {
        Ok(self
            .segments()?
            .into_iter()
            .filter(|segment| bounds.contains(segment.midpoint()))
            .collect())
    }
}

/// Trip fields resolved by the caller before an id is assigned.
#[derive(Debug, Clone)]
pub struct TripDraft {
    pub user_id: u64,
    pub from: Coordinate,
    pub to: Coordinate,
    pub geometry: Geometry,
    pub distance_m: f64,
    pub duration_s: f64,
}

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<u64, User>,
    usernames: DashMap<String, u64>,
    segments: DashMap<u64, RoadSegment>,
    reports: DashMap<u64, Report>,
    trips: DashMap<u64, Trip>,
    next_user_id: AtomicU64,
    next_segment_id: AtomicU64,
    next_report_id: AtomicU64,
    next_trip_id: AtomicU64,
}

fn next_id(counter: &AtomicU64) -> u64 {
    counter.fetch_add(1, Ordering::SeqCst) + 1
}

fn sorted_by_id<T: Clone>(map: &DashMap<u64, T>) -> Vec<T> {
    let mut entries: Vec<(u64, T)> = map
        .iter()
        .map(|entry| (*entry.key(), entry.value().clone()))
        .collect();
    entries.sort_by_key(|(id, _)| *id);
    entries.into_iter().map(|(_, value)| value).collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding user "alice" and two demo segments, one of them a
    /// maintenance segment with a pothole.
    pub fn with_demo_data() -> Result<Self, StoreError> {
        let store = Self::new();
        let alice = store.create_user(CreateUser {
            username: "alice".to_string(),
        })?;

        store.create_segment(CreateSegment {
            user_id: alice.id,
            start: Coordinate::new(1.3521, 103.8198),
            end: Coordinate::new(1.3621, 103.8298),
            status: SegmentStatus::Optimal,
            obstacle: None,
        })?;
        store.create_segment(CreateSegment {
            user_id: alice.id,
            start: Coordinate::new(1.3321, 103.8798),
            end: Coordinate::new(1.3421, 103.8898),
            status: SegmentStatus::Maintenance,
            obstacle: Some("pothole".to_string()),
        })?;

        tracing::info!(
            "seeded demo data: {} user(s), {} segment(s)",
            store.users.len(),
            store.segments.len()
        );
        Ok(store)
    }

    // ---- users ----

    /// Returns the existing user when the username is already taken.
    pub fn create_user(&self, req: CreateUser) -> Result<User, StoreError> {
        let username = req.username.trim().to_string();
        if username.is_empty() {
            return Err(StoreError::InvalidInput("username must not be empty".into()));
        }

        let id = *self
            .usernames
            .entry(username.clone())
            .or_insert_with(|| {
                let id = next_id(&self.next_user_id);
                self.users.insert(
                    id,
                    User {
                        id,
                        username: username.clone(),
                        created_at: Utc::now(),
                    },
                );
                tracing::debug!("created user {id} ({username})");
                id
            })
            .value();

        self.users
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound { kind: "user", id })
    }

    pub fn users(&self) -> Vec<User> {
        sorted_by_id(&self.users)
    }

    pub fn ensure_user(&self, user_id: u64) -> Result<(), StoreError> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(StoreError::UnknownUser(user_id))
        }
    }

    // ---- segments ----

    pub fn create_segment(&self, req: CreateSegment) -> Result<RoadSegment, StoreError> {
        self.ensure_user(req.user_id)?;
        if !req.start.is_valid() || !req.end.is_valid() {
            return Err(StoreError::InvalidInput(
                "segment endpoints must be valid coordinates".into(),
            ));
        }

        let id = next_id(&self.next_segment_id);
        let segment = RoadSegment {
            id,
            user_id: req.user_id,
            start: req.start,
            end: req.end,
            status: req.status,
            obstacle: req.obstacle,
            created_at: Utc::now(),
        };
        self.segments.insert(id, segment.clone());
        tracing::debug!("created segment {id} with status {}", segment.status);
        Ok(segment)
    }

    pub fn segment(&self, id: u64) -> Result<RoadSegment, StoreError> {
        self.segments
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound { kind: "segment", id })
    }

    pub fn update_segment_status(
        &self,
        id: u64,
        new_status: &str,
    ) -> Result<SegmentStatusUpdate, StoreError> {
        let new_status: SegmentStatus = new_status
            .parse()
            .map_err(|_| StoreError::InvalidStatus(new_status.to_string()))?;

        let mut segment = self
            .segments
            .get_mut(&id)
            .ok_or(StoreError::NotFound { kind: "segment", id })?;
        let old_status = segment.status;
        segment.status = new_status;
        tracing::info!("segment {id} status {old_status} -> {new_status}");

        Ok(SegmentStatusUpdate {
            segment_id: id,
            old_status,
            new_status,
            updated_at: Utc::now(),
        })
    }

    // ---- reports ----

    pub fn create_report(&self, segment_id: u64, req: CreateReport) -> Result<Report, StoreError> {
        self.segment(segment_id)?;
        let id = next_id(&self.next_report_id);
        let report = Report {
            id,
            segment_id,
            note: req.note,
            confirmed: false,
            created_at: Utc::now(),
        };
        self.reports.insert(id, report.clone());
        Ok(report)
    }

    pub fn reports_for(&self, segment_id: u64) -> Result<Vec<Report>, StoreError> {
        self.segment(segment_id)?;
        Ok(sorted_by_id(&self.reports)
            .into_iter()
            .filter(|report| report.segment_id == segment_id)
            .collect())
    }

    pub fn confirm_report(&self, id: u64) -> Result<Report, StoreError> {
        let mut report = self
            .reports
            .get_mut(&id)
            .ok_or(StoreError::NotFound { kind: "report", id })?;
        report.confirmed = true;
        Ok(report.value().clone())
    }

    pub fn batch_confirm(&self, ids: &[u64]) -> Vec<BatchConfirmResult> {
        ids.iter()
            .map(|&id| match self.confirm_report(id) {
                Ok(_) => BatchConfirmResult {
                    id,
                    confirmed: Some(true),
                    error: None,
                },
                Err(_) => BatchConfirmResult {
                    id,
                    confirmed: None,
                    error: Some("not found".to_string()),
                },
            })
            .collect()
    }

    pub fn aggregate(&self, segment_id: u64) -> Result<ReportAggregate, StoreError> {
        let reports = self.reports_for(segment_id)?;
        Ok(ReportAggregate {
            segment_id,
            reports_total: reports.len(),
            reports_confirmed: reports.iter().filter(|r| r.confirmed).count(),
        })
    }

    /// Confirms every pending report of a segment once at least `threshold` are pending.
    pub fn auto_confirm(
        &self,
        segment_id: u64,
        threshold: usize,
    ) -> Result<AutoConfirmResult, StoreError> {
        let pending: Vec<u64> = self
            .reports_for(segment_id)?
            .into_iter()
            .filter(|report| !report.confirmed)
            .map(|report| report.id)
            .collect();

        if pending.len() < threshold {
            return Ok(AutoConfirmResult {
                auto_confirmed: 0,
                report_ids: Vec::new(),
                message: Some(format!("Need at least {threshold} unconfirmed reports")),
            });
        }

        for id in &pending {
            if let Some(mut report) = self.reports.get_mut(id) {
                report.confirmed = true;
            }
        }
        tracing::info!("auto-confirmed {} report(s) on segment {segment_id}", pending.len());

        Ok(AutoConfirmResult {
            auto_confirmed: pending.len(),
            report_ids: pending,
            message: None,
        })
    }

    // ---- trips ----

    pub fn insert_trip(&self, draft: TripDraft) -> Result<Trip, StoreError> {
        self.ensure_user(draft.user_id)?;
        let id = next_id(&self.next_trip_id);
        let trip = Trip {
            id,
            user_id: draft.user_id,
            from: draft.from,
            to: draft.to,
            distance_m: round_to(draft.distance_m, 1),
            duration_s: round_to(draft.duration_s, 1),
            created_at: Utc::now(),
            geometry: draft.geometry,
        };
        self.trips.insert(id, trip.clone());
        Ok(trip)
    }

    /// Newest first, optionally restricted to one user.
    pub fn trips(&self, user_id: Option<u64>) -> Vec<Trip> {
        let mut trips: Vec<Trip> = sorted_by_id(&self.trips)
            .into_iter()
            .filter(|trip| user_id.map_or(true, |uid| trip.user_id == uid))
            .collect();
        trips.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        trips
    }

    pub fn trip(&self, id: u64) -> Result<Trip, StoreError> {
        self.trips
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound { kind: "trip", id })
    }

    pub fn delete_trip(&self, id: u64) -> Result<(), StoreError> {
        self.trips
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound { kind: "trip", id })
    }

    // ---- stats ----

    pub fn stats(&self) -> Stats {
        let mut segment_status_counts = BTreeMap::new();
        for segment in self.segments.iter() {
            *segment_status_counts.entry(segment.status).or_insert(0) += 1;
        }
        let total_distance_m: f64 = self.trips.iter().map(|trip| trip.distance_m).sum();

        Stats {
            users: self.users.len(),
            segments: self.segments.len(),
            reports: ReportCounts {
                total: self.reports.len(),
                confirmed: self.reports.iter().filter(|r| r.confirmed).count(),
            },
            trips: self.trips.len(),
            total_distance_km: round_to(total_distance_m / 1000.0, 2),
            segment_status_counts,
        }
    }
}

impl SegmentRepository for MemoryStore {
    fn segments(&self) -> Result<Vec<RoadSegment>, StoreError> {
        Ok(sorted_by_id(&self.segments))
    }
}
