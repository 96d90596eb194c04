//! Tests for position searches, path planning, scoring, and formations.

use glam::DVec2;
use proptest::prelude::*;

use overwatch_core::components::{RoadSegment, Threat};
use overwatch_core::config::AnalysisConfig;
use overwatch_core::constants::{CONCEALMENT_REMOTENESS_WEIGHT, THREAT_MAX_ITERATIONS};
use overwatch_core::enums::*;
use overwatch_core::error::TerrainError;
use overwatch_core::state::{PositionCandidate, PositionRequirements};
use overwatch_terrain::{HeightField, RasterHeader, TerrainSession};

use crate::formation::{formation_offsets, generate_formation_points};
use crate::paths::PathPlanner;
use crate::sampling::SearchArea;
use crate::scoring::{find_best_positions, score_position, BestPositionQuery, Scorer};
use crate::search::PositionSearch;

/// 100×100 raster, 10 m cells, with a 20 m ridge on rows 40..=60 (z in [400, 600]).
fn make_ridge_field() -> HeightField {
    let elevations: Vec<f32> = (0..100)
        .flat_map(|row| (0..100).map(move |_| if (40..=60).contains(&row) { 20.0 } else { 0.0 }))
        .collect();
    HeightField::new(RasterHeader::new(100, 100, 10.0, 0.0, 20.0), elevations, Vec::new()).unwrap()
}

fn make_flat_field() -> HeightField {
    HeightField::new(RasterHeader::new(100, 100, 10.0, 0.0, 0.0), vec![0.0; 100 * 100], Vec::new()).unwrap()
}

/// 100×100 raster, 10 m cells, with `height(col, row)` at each node.
fn field_from(height: impl Fn(usize, usize) -> f32) -> HeightField {
    let elevations: Vec<f32> = (0..100)
        .flat_map(|row| (0..100).map(move |col| (row, col)))
        .map(|(row, col)| height(col, row))
        .collect();
    let min = elevations.iter().copied().fold(f32::INFINITY, f32::min) as f64;
    let max = elevations.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    HeightField::new(RasterHeader::new(100, 100, 10.0, min, max), elevations, Vec::new()).unwrap()
}

fn concealment_at(session: &TerrainSession, p: DVec2) -> PositionCandidate {
    let mut found = PositionSearch::new(session)
        .find_concealed_positions(&SearchArea::new(p, 1.0, 1), 0.0)
        .unwrap();
    assert_eq!(found.len(), 1, "one sample at {p}");
    found.remove(0)
}

fn session_with_roads(field: HeightField, roads: Vec<RoadSegment>) -> TerrainSession {
    TerrainSession::new(field, roads, Vec::new(), AnalysisConfig::default()).unwrap()
}

// ---- Position searches ----

#[test]
fn test_ridge_elevated_positions() {
    let session = TerrainSession::terrain_only(make_ridge_field()).unwrap();
    let search = PositionSearch::new(&session);
    let area = SearchArea::new(DVec2::new(500.0, 500.0), 100.0, 50);

    let found = search.find_elevated_positions(&area, 10.0).unwrap();
    assert!(!found.is_empty(), "Ridge crest should stand above its surroundings");
    for c in &found {
        assert!(c.metric(Metric::HeightAdvantage) >= 10.0);
        assert_eq!(c.position.y, 20.0);
    }
    assert!(found
        .windows(2)
        .all(|w| w[0].metric(Metric::HeightAdvantage) >= w[1].metric(Metric::HeightAdvantage)));

    let none = search.find_elevated_positions(&area, 50.0).unwrap();
    assert!(none.is_empty(), "No point is 50 m above anything on a 20 m ridge");
}

#[test]
fn test_flat_raster_is_fully_flat_and_never_elevated() {
    let session = TerrainSession::terrain_only(make_flat_field()).unwrap();
    let search = PositionSearch::new(&session);
    let area = SearchArea::new(DVec2::new(500.0, 500.0), 200.0, 30);

    let flat = search.find_flat_area(&area, 50.0, 5.0, 0.9).unwrap();
    assert!(!flat.is_empty());
    assert!(flat.iter().all(|c| c.metric(Metric::Flatness) == 1.0));

    assert!(search.find_elevated_positions(&area, 0.0).unwrap().is_empty());
}

#[test]
fn test_flat_area_rejects_steep_patch() {
    let session = TerrainSession::terrain_only(make_ridge_field()).unwrap();
    let search = PositionSearch::new(&session);
    // Centered on the ridge flank at z = 400: the step is far steeper than 5 degrees.
    let area = SearchArea::new(DVec2::new(500.0, 400.0), 1.0, 1);
    let found = search.find_flat_area(&area, 20.0, 5.0, 1.0).unwrap();
    assert!(found.is_empty());
}

#[test]
fn test_concealment_on_remote_flat_ground() {
    let session = TerrainSession::terrain_only(make_flat_field()).unwrap();
    let search = PositionSearch::new(&session);
    let area = SearchArea::new(DVec2::new(500.0, 500.0), 100.0, 10);
    let found = search.find_concealed_positions(&area, 0.1).unwrap();
    assert!(!found.is_empty());
    for c in &found {
        // No depth, no roughness, no road anywhere: only the remoteness term.
        assert!((c.metric(Metric::Concealment) - CONCEALMENT_REMOTENESS_WEIGHT).abs() < 1e-9);
    }
    assert!(search.find_concealed_positions(&area, 0.5).unwrap().is_empty());
}

#[test]
fn test_concealment_prefers_hollows() {
    // A cone pit at (250, 250) and a cone hill at (750, 750) on a 20 m plain.
    let cone = |col: usize, row: usize, cx: f64, cz: f64| {
        let d = DVec2::new(col as f64 * 10.0, row as f64 * 10.0).distance(DVec2::new(cx, cz));
        20.0 * (1.0 - d / 150.0).max(0.0)
    };
    let field = field_from(|col, row| (20.0 - cone(col, row, 250.0, 250.0) + cone(col, row, 750.0, 750.0)) as f32);
    let session = TerrainSession::terrain_only(field).unwrap();

    let hollow = concealment_at(&session, DVec2::new(250.0, 250.0));
    let crest = concealment_at(&session, DVec2::new(750.0, 750.0));
    assert!(hollow.metric(Metric::Depth) > 10.0, "hollow depth {}", hollow.metric(Metric::Depth));
    assert_eq!(crest.metric(Metric::Depth), 0.0);
    assert!(hollow.metric(Metric::Concealment) > crest.metric(Metric::Concealment) + 0.25);
}

#[test]
fn test_concealment_rewards_rough_ground() {
    // Checkerboard of 5 m and 0 m nodes; (500, 500) sits on a 5 m node, so
    // its ring is never higher on average and depth stays zero.
    let checkerboard = field_from(|col, row| if (col + row) % 2 == 0 { 5.0 } else { 0.0 });
    let rough = TerrainSession::terrain_only(checkerboard).unwrap();
    let smooth = TerrainSession::terrain_only(make_flat_field()).unwrap();

    let p = DVec2::new(500.0, 500.0);
    let r = concealment_at(&rough, p);
    let s = concealment_at(&smooth, p);
    assert_eq!(r.metric(Metric::Depth), 0.0);
    assert!(r.metric(Metric::Roughness) > 0.5, "roughness {}", r.metric(Metric::Roughness));
    assert_eq!(s.metric(Metric::Roughness), 0.0);
    assert!(r.metric(Metric::Concealment) > s.metric(Metric::Concealment));
}

#[test]
fn test_concealment_drops_near_roads() {
    let road = RoadSegment::new(DVec2::new(0.0, 500.0), DVec2::new(990.0, 500.0));
    let session = session_with_roads(make_flat_field(), vec![road]);

    let near = concealment_at(&session, DVec2::new(500.0, 520.0));
    let far = concealment_at(&session, DVec2::new(500.0, 100.0));
    assert!((near.metric(Metric::RoadDistance) - 20.0).abs() < 1e-6);
    assert!((far.metric(Metric::RoadDistance) - 400.0).abs() < 1e-6);
    assert!(near.metric(Metric::Concealment) < far.metric(Metric::Concealment));
    // Flat ground: the remoteness term is all that differs.
    let expected = CONCEALMENT_REMOTENESS_WEIGHT * (400.0 - 20.0) / 2000.0;
    assert!((far.metric(Metric::Concealment) - near.metric(Metric::Concealment) - expected).abs() < 1e-9);
}

#[test]
fn test_observation_posts_require_sight() {
    let session = TerrainSession::terrain_only(make_ridge_field()).unwrap();
    let search = PositionSearch::new(&session);
    // Lattice rows at z = 425..575 in 25 m steps. With 2 m eyes only the
    // southern row clears the ridge edge at z = 400 toward the target.
    let area = SearchArea::new(DVec2::new(500.0, 500.0), 100.0, 50);
    let target = DVec2::new(500.0, 100.0);

    let all = search.find_observation_posts(&area, target, 5.0, false).unwrap();
    let seen = search.find_observation_posts(&area, target, 5.0, true).unwrap();
    assert!(!seen.is_empty(), "The southern edge of the crest sees the target");
    assert!(seen.len() < all.len(), "Posts behind the crest must be dropped");
    assert!(seen.iter().all(|c| c.metric(Metric::LineOfSight) == 1.0 && c.position.z < 450.0));

    let blind: Vec<_> = all.iter().filter(|c| c.metric(Metric::LineOfSight) == 0.0).collect();
    assert_eq!(blind.len(), all.len() - seen.len());
    assert!(blind.iter().any(|c| c.position.z > 550.0));
    assert!(all
        .windows(2)
        .all(|w| w[0].metric(Metric::LineOfSight) >= w[1].metric(Metric::LineOfSight)));
}

#[test]
fn test_observation_posts_need_positive_advantage() {
    let session = TerrainSession::terrain_only(make_flat_field()).unwrap();
    let search = PositionSearch::new(&session);
    let area = SearchArea::new(DVec2::new(500.0, 500.0), 200.0, 30);
    let target = DVec2::new(500.0, 900.0);
    assert!(search.find_observation_posts(&area, target, 0.0, false).unwrap().is_empty());
    assert!(search.find_observation_posts(&area, target, -5.0, false).unwrap().is_empty());
}

#[test]
fn test_fire_positions_respect_distance_band() {
    let session = TerrainSession::terrain_only(make_ridge_field()).unwrap();
    let search = PositionSearch::new(&session);
    let area = SearchArea::new(DVec2::new(500.0, 300.0), 250.0, 80);
    let target = DVec2::new(500.0, 500.0);

    let found = search.find_fire_positions(&area, target, 100.0, 300.0, false).unwrap();
    assert!(!found.is_empty());
    for c in &found {
        let d = c.metric(Metric::DistanceToTarget);
        assert!((100.0..=300.0).contains(&d), "distance {d} outside band");
    }
    assert!(found
        .windows(2)
        .all(|w| w[0].metric(Metric::DistanceToTarget) <= w[1].metric(Metric::DistanceToTarget)));

    let defilade_first = search.find_fire_positions(&area, target, 100.0, 300.0, true).unwrap();
    assert!(defilade_first
        .windows(2)
        .all(|w| w[0].metric(Metric::Defilade) >= w[1].metric(Metric::Defilade)));

    assert!(matches!(
        search.find_fire_positions(&area, target, 300.0, 100.0, false),
        Err(TerrainError::InvalidDistanceRange { .. })
    ));
}

#[test]
fn test_choke_points_on_flat_ground() {
    let session = TerrainSession::terrain_only(make_flat_field()).unwrap();
    let search = PositionSearch::new(&session);
    let found = search
        .find_choke_points(DVec2::new(100.0, 500.0), DVec2::new(900.0, 500.0), 9, 200.0, 1.0)
        .unwrap();
    assert_eq!(found.len(), 9, "Zero variance everywhere is below any positive threshold");
    assert!(found.iter().all(|c| c.metric(Metric::Narrowness) == 0.0));

    assert!(search
        .find_choke_points(DVec2::new(100.0, 500.0), DVec2::new(100.0, 500.0), 9, 200.0, 1.0)
        .is_err());
    assert!(search
        .find_choke_points(DVec2::new(100.0, 500.0), DVec2::new(900.0, 500.0), 1, 200.0, 1.0)
        .is_err());
}

#[test]
fn test_choke_points_rank_corridor_over_rough_ground() {
    // West of x = 600: a flat floor at z 450..550 between 40 m walls.
    // East of it: open ground with 10 m ribs on every odd row.
    let field = field_from(|col, row| {
        if col < 60 {
            if (45..=55).contains(&row) {
                0.0
            } else {
                40.0
            }
        } else if row % 2 == 1 {
            10.0
        } else {
            0.0
        }
    });
    let session = TerrainSession::terrain_only(field).unwrap();
    let search = PositionSearch::new(&session);
    let (start, end) = (DVec2::new(100.0, 500.0), DVec2::new(900.0, 500.0));

    // 9 steps land on x = 100, 200, ..., 900; an 80 m section stays on the floor.
    let ranked = search.find_choke_points(start, end, 9, 80.0, 50.0).unwrap();
    assert_eq!(ranked.len(), 9);
    for c in &ranked[..5] {
        assert!(c.position.x < 600.0, "corridor point expected, got x = {}", c.position.x);
        assert_eq!(c.metric(Metric::Narrowness), 0.0);
        assert_eq!(c.metric(Metric::Relief), 0.0);
    }
    for c in &ranked[5..] {
        assert!(c.position.x >= 600.0);
        assert!(c.metric(Metric::Narrowness) > 20.0, "rough variance {}", c.metric(Metric::Narrowness));
        assert_eq!(c.metric(Metric::Relief), 10.0);
    }

    let tight = search.find_choke_points(start, end, 9, 80.0, 1.0).unwrap();
    assert_eq!(tight.len(), 5, "The threshold drops all rough points");
    assert!(tight.iter().all(|c| c.position.x < 600.0));
}

#[test]
fn test_search_rejects_bad_area() {
    let session = TerrainSession::terrain_only(make_flat_field()).unwrap();
    let search = PositionSearch::new(&session);
    let area = SearchArea::new(DVec2::new(500.0, 500.0), 0.0, 10);
    assert!(matches!(
        search.find_elevated_positions(&area, 1.0),
        Err(TerrainError::InvalidParameter { name: "radius", .. })
    ));
}

// ---- Paths ----

#[test]
fn test_road_path_on_one_segment() {
    let road = RoadSegment::new(DVec2::new(100.0, 500.0), DVec2::new(900.0, 500.0));
    let session = session_with_roads(make_flat_field(), vec![road]);
    let planner = PathPlanner::new(&session);

    let path = planner
        .road_following_path(DVec2::new(300.0, 500.0), DVec2::new(600.0, 500.0), 50.0, 100.0)
        .unwrap();
    assert_eq!(path.waypoints.len(), 2);
    assert_eq!(path.off_road_jumps, 0);
    assert!(path.used_roads);
    assert!(path.waypoints.iter().all(|w| w.kind == WaypointKind::Endpoint));
}

#[test]
fn test_road_path_follows_network() {
    let roads = vec![
        RoadSegment::new(DVec2::new(100.0, 100.0), DVec2::new(100.0, 800.0)),
        RoadSegment::new(DVec2::new(100.0, 800.0), DVec2::new(800.0, 800.0)),
    ];
    let session = session_with_roads(make_flat_field(), roads);
    let path = PathPlanner::new(&session)
        .road_following_path(DVec2::new(120.0, 200.0), DVec2::new(700.0, 780.0), 50.0, 500.0)
        .unwrap();
    assert_eq!(path.off_road_jumps, 0);
    let corner = DVec2::new(100.0, 800.0);
    assert!(
        path.waypoints.iter().any(|w| w.position.horizontal().distance(corner) < 1e-9),
        "Route should pass the road corner"
    );
}

#[test]
fn test_road_path_reports_disconnected_roads() {
    let roads = vec![
        RoadSegment::new(DVec2::new(100.0, 100.0), DVec2::new(300.0, 100.0)),
        RoadSegment::new(DVec2::new(600.0, 800.0), DVec2::new(900.0, 800.0)),
    ];
    let session = session_with_roads(make_flat_field(), roads);
    let path = PathPlanner::new(&session)
        .road_following_path(DVec2::new(200.0, 110.0), DVec2::new(700.0, 790.0), 50.0, 100.0)
        .unwrap();
    assert_eq!(path.off_road_jumps, 1);
    assert!(path.waypoints.iter().any(|w| w.kind == WaypointKind::OffRoad));
    for w in path.waypoints.windows(2) {
        let leg = w[0].position.horizontal().distance(w[1].position.horizontal());
        let off_road = w[1].kind == WaypointKind::OffRoad || w[0].kind == WaypointKind::OffRoad;
        assert!(!off_road || leg <= 100.0 + 1e-9, "off-road leg {leg} too long");
    }
}

#[test]
fn test_road_path_without_roads_is_straight() {
    let session = TerrainSession::terrain_only(make_flat_field()).unwrap();
    let path = PathPlanner::new(&session)
        .road_following_path(DVec2::new(100.0, 100.0), DVec2::new(500.0, 100.0), 50.0, 1000.0)
        .unwrap();
    assert!(!path.used_roads);
    assert_eq!(path.off_road_jumps, 1);
    assert_eq!(path.waypoints.len(), 2);
}

#[test]
fn test_terrain_following_stays_above_ground() {
    let session = TerrainSession::terrain_only(make_ridge_field()).unwrap();
    let planner = PathPlanner::new(&session);
    let start = DVec2::new(500.0, 100.0);
    let end = DVec2::new(500.0, 900.0);

    for smoothness in [0.0, 0.5, 1.0] {
        let path = planner.terrain_following_path(start, end, 41, 30.0, smoothness).unwrap();
        assert_eq!(path.len(), 41);
        assert_eq!(path[0].position.y, 30.0);
        assert_eq!(path[40].position.y, 30.0);
        for w in &path {
            let ground = session.ground(w.position.horizontal());
            assert!(w.position.y >= ground, "waypoint below terrain");
        }
    }
    let exact = planner.terrain_following_path(start, end, 41, 30.0, 0.0).unwrap();
    assert_eq!(exact[20].position.y, 50.0);

    assert!(planner.terrain_following_path(start, end, 1, 30.0, 0.5).is_err());
    assert!(planner.terrain_following_path(start, end, 10, 30.0, 1.5).is_err());
}

#[test]
fn test_threat_path_clears_single_threat() {
    let session = TerrainSession::terrain_only(make_flat_field()).unwrap();
    let planner = PathPlanner::new(&session);
    let threats = [Threat::new(DVec2::new(500.0, 500.0), 150.0)];
    let path = planner
        .threat_avoiding_path(
            DVec2::new(100.0, 500.0),
            DVec2::new(900.0, 500.0),
            &threats,
            20.0,
            100.0,
            THREAT_MAX_ITERATIONS,
        )
        .unwrap();
    assert!(path.converged);
    assert!(path.residual.is_empty());
    assert!(path.waypoints.len() > 2);
    assert!(path.waypoints.iter().any(|w| w.kind == WaypointKind::Detour));
    assert!(path.waypoints.iter().all(|w| w.position.y == 100.0));
}

#[test]
fn test_threat_path_hugs_disk_when_ends_are_close() {
    let session = TerrainSession::terrain_only(make_flat_field()).unwrap();
    let planner = PathPlanner::new(&session);
    let threats = [Threat::new(DVec2::new(500.0, 500.0), 100.0)];
    let path = planner
        .threat_avoiding_path(
            DVec2::new(399.0, 500.0),
            DVec2::new(601.0, 500.0),
            &threats,
            0.0,
            50.0,
            THREAT_MAX_ITERATIONS,
        )
        .unwrap();
    assert!(path.converged);
    let detours = path.waypoints.iter().filter(|w| w.kind == WaypointKind::Detour).count();
    assert_eq!(detours, 2);
    let length: f64 = path
        .waypoints
        .windows(2)
        .map(|w| w[0].position.horizontal().distance(w[1].position.horizontal()))
        .sum();
    assert!(length < 400.0, "detour is {length} m long");
    assert!(path
        .waypoints
        .iter()
        .all(|w| w.position.horizontal().distance(DVec2::new(500.0, 500.0)) < 200.0));
}

#[test]
fn test_threat_path_reports_residual_when_start_inside() {
    let session = TerrainSession::terrain_only(make_flat_field()).unwrap();
    let planner = PathPlanner::new(&session);
    let threats = [Threat::new(DVec2::new(100.0, 500.0), 150.0)];
    let path = planner
        .threat_avoiding_path(
            DVec2::new(100.0, 500.0),
            DVec2::new(900.0, 500.0),
            &threats,
            0.0,
            50.0,
            THREAT_MAX_ITERATIONS,
        )
        .unwrap();
    assert!(!path.converged);
    assert_eq!(path.residual.len(), 1);
    assert_eq!(path.residual[0].threat, 0);
    assert_eq!(path.residual[0].min_distance, 0.0);
}

#[test]
fn test_clearance_and_orbit() {
    let session = TerrainSession::terrain_only(make_ridge_field()).unwrap();
    let planner = PathPlanner::new(&session);

    let orbit = planner.orbit_path(DVec2::new(500.0, 500.0), 50.0, 10.0, 8).unwrap();
    assert_eq!(orbit.len(), 8);
    assert!(orbit.iter().all(|w| w.kind == WaypointKind::Orbit));
    assert!(planner.validate_clearance(&orbit, 5.0).is_empty());
    assert_eq!(planner.validate_clearance(&orbit, 15.0).len(), 8);
    assert!(planner.orbit_path(DVec2::new(500.0, 500.0), 50.0, 10.0, 2).is_err());
}

// ---- Scoring ----

#[test]
fn test_score_flat_ground_without_roads() {
    let session = TerrainSession::terrain_only(make_flat_field()).unwrap();
    let scorer = Scorer::for_profile(ScorerProfile::Airbase);
    let score = score_position(&session, &scorer, DVec2::new(500.0, 500.0), &PositionRequirements::default(), &[]);
    assert!(score.meets_requirements, "issues: {:?}", score.issues);
    assert_eq!(score.criterion(Criterion::RoadAccess), 0.0);
    assert_eq!(score.criterion(Criterion::SlopeFit), 1.0);
    assert!((score.total - 0.8).abs() < 1e-9, "total {}", score.total);

    let logistics = Scorer::for_profile(ScorerProfile::Logistics);
    let score = score_position(&session, &logistics, DVec2::new(500.0, 500.0), &PositionRequirements::default(), &[]);
    assert!(!score.meets_requirements, "Logistics needs a road");
    assert_eq!(score.issues.len(), 1);
}

#[test]
fn test_score_constraints_independent_of_total() {
    let session = TerrainSession::terrain_only(make_ridge_field()).unwrap();
    let scorer = Scorer::for_profile(ScorerProfile::Defensive);
    let requirements = PositionRequirements {
        min_altitude: 50.0,
        ..Default::default()
    };
    let p = DVec2::new(500.0, 500.0);
    let threats = [Threat::new(DVec2::new(520.0, 500.0), 1000.0)];
    let score = score_position(&session, &scorer, p, &requirements, &threats);
    assert!(!score.meets_requirements);
    assert_eq!(score.issues.len(), 2, "issues: {:?}", score.issues);
    assert!(score.total > 0.0);

    let off_map = score_position(&session, &scorer, DVec2::new(-10.0, 0.0), &requirements, &[]);
    assert!(!off_map.meets_requirements);
    assert_eq!(off_map.total, 0.0);
}

#[test]
fn test_best_positions_are_separated_and_deterministic() {
    let session = TerrainSession::terrain_only(make_ridge_field()).unwrap();
    let scorer = Scorer::for_profile(ScorerProfile::Defensive);
    let query = BestPositionQuery {
        center: DVec2::new(500.0, 500.0),
        radius: 300.0,
        requirements: PositionRequirements::default(),
        count: 5,
        min_separation: 80.0,
        max_attempts: 200,
        seed: 99,
    };
    let a = find_best_positions(&session, &scorer, &query, &[]).unwrap();
    let b = find_best_positions(&session, &scorer, &query, &[]).unwrap();
    assert_eq!(a, b, "Same seed should give the same positions");
    assert_eq!(a.len(), 5);
    assert!(a.windows(2).all(|w| w[0].score.total >= w[1].score.total));
    for (i, x) in a.iter().enumerate() {
        assert!(x.score.meets_requirements);
        assert_eq!(x.candidate.metric(Metric::Score), x.score.total);
        for y in &a[i + 1..] {
            let d = x.candidate.position.horizontal().distance(y.candidate.position.horizontal());
            assert!(d >= 80.0, "accepted positions {d} m apart");
        }
    }

    let json_a = serde_json::to_string(&a).unwrap();
    let json_b = serde_json::to_string(&b).unwrap();
    assert_eq!(json_a, json_b);
}

#[test]
fn test_best_positions_returns_fewer_when_exhausted() {
    let session = TerrainSession::terrain_only(make_flat_field()).unwrap();
    let scorer = Scorer::for_profile(ScorerProfile::Airbase);
    let query = BestPositionQuery {
        center: DVec2::new(500.0, 500.0),
        radius: 50.0,
        requirements: PositionRequirements::default(),
        count: 10,
        min_separation: 200.0,
        max_attempts: 40,
        seed: 1,
    };
    let found = find_best_positions(&session, &scorer, &query, &[]).unwrap();
    assert_eq!(found.len(), 1, "A 50 m disk holds one position 200 m from all others");
}

// ---- Formations ----

#[test]
fn test_box_formation_preconditions() {
    assert!(matches!(
        generate_formation_points(DVec2::ZERO, FormationType::Box, 6, 10.0, 0.0),
        Err(TerrainError::NonSquareBoxFormation { count: 6 })
    ));
    let grid = generate_formation_points(DVec2::new(50.0, 50.0), FormationType::Box, 9, 10.0, 0.0).unwrap();
    assert_eq!(grid.len(), 9);
    assert!(grid.contains(&DVec2::new(50.0, 50.0)));
}

proptest! {
    #[test]
    fn prop_formation_has_count_points(
        count in 0usize..40,
        spacing in 0.5f64..100.0,
        heading in 0.0f64..360.0,
        kind in prop_oneof![
            Just(FormationType::Line),
            Just(FormationType::Wedge),
            Just(FormationType::Circle),
            Just(FormationType::Column),
        ],
    ) {
        let pts = formation_offsets(kind, count, spacing, heading).unwrap();
        prop_assert_eq!(pts.len(), count);
    }

    #[test]
    fn prop_threat_path_clears_disk(
        cx in 400.0f64..600.0,
        cz in 450.0f64..550.0,
        range in 20.0f64..250.0,
        margin in 0.0f64..50.0,
    ) {
        let session = TerrainSession::terrain_only(make_flat_field()).unwrap();
        let planner = PathPlanner::new(&session);
        let center = DVec2::new(cx, cz);
        let threats = [Threat::new(center, range)];
        let path = planner
            .threat_avoiding_path(
                DVec2::new(0.0, 500.0),
                DVec2::new(990.0, 500.0),
                &threats,
                margin,
                0.0,
                THREAT_MAX_ITERATIONS,
            )
            .unwrap();
        prop_assert!(path.converged);
        let required = range + margin;
        for w in path.waypoints.windows(2) {
            let a = w[0].position.horizontal();
            let b = w[1].position.horizontal();
            let d = b - a;
            let t = ((center - a).dot(d) / d.length_squared()).clamp(0.0, 1.0);
            let closest = (a + d * t).distance(center);
            prop_assert!(closest >= required - 1e-6, "closest {} < {}", closest, required);
        }
    }

    #[test]
    fn prop_jittered_search_is_deterministic(seed in 0u64..1000) {
        let session = TerrainSession::terrain_only(make_ridge_field()).unwrap();
        let search = PositionSearch::new(&session);
        let area = SearchArea::new(DVec2::new(500.0, 500.0), 200.0, 30).jittered(seed);
        prop_assert_eq!(
            search.find_concealed_positions(&area, 0.0).unwrap(),
            search.find_concealed_positions(&area, 0.0).unwrap()
        );
    }
}
