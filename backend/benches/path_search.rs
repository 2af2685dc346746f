use backend::models::{
    Coordinate, CreateSegment, CreateUser, PathSearchRequest, Preference, SegmentStatus,
};
use backend::search::{search_paths, SearchConfig};
use backend::store::MemoryStore;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const ORIGIN: Coordinate = Coordinate::new(45.478, 9.227);
const DESTINATION: Coordinate = Coordinate::new(45.464, 9.190);

/// Grid of short segments around the search area, every fifth one a pothole.
fn populated_store(segment_count: usize) -> MemoryStore {
    let store = MemoryStore::new();
    let user = store
        .create_user(CreateUser {
            username: "bench".to_string(),
        })
        .expect("bench user");

    let side = (segment_count as f64).sqrt().ceil() as usize;
    for i in 0..segment_count {
        let lat = 45.44 + (i / side) as f64 * 0.06 / side as f64;
        let lon = 9.17 + (i % side) as f64 * 0.08 / side as f64;
        let (status, obstacle) = if i % 5 == 0 {
            (SegmentStatus::Maintenance, Some("pothole".to_string()))
        } else {
            (SegmentStatus::Optimal, None)
        };
        store
            .create_segment(CreateSegment {
                user_id: user.id,
                start: Coordinate::new(lat, lon),
                end: Coordinate::new(lat + 0.0003, lon + 0.0003),
                status,
                obstacle,
            })
            .expect("bench segment");
    }
    store
}

fn benchmark_path_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_search");
    let config = SearchConfig::default();

    for segment_count in [0, 100, 1_000, 10_000] {
        let store = populated_store(segment_count);
        let request = PathSearchRequest {
            origin: ORIGIN,
            destination: DESTINATION,
            preferences: Preference::Balanced,
            n: 5,
        };

        group.bench_with_input(
            BenchmarkId::from_parameter(segment_count),
            &request,
            |b, request| b.iter(|| search_paths(&store, black_box(request), &config)),
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_path_search);
criterion_main!(benches);
