//! Path generation: road following, terrain following, threat avoidance.
//!
//! Paths never fail on geometry. Degraded results say how they degraded:
//! `RoadPath::off_road_jumps` counts direct legs the road network could not
//! cover, and `ThreatPath::residual` lists threats the path still violates.

use std::f64::consts::TAU;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use overwatch_core::components::Threat;
use overwatch_core::constants::{DETOUR_CLEARANCE_FACTOR, DETOUR_MAX_WRAP_DEG, PATH_DEDUP_DISTANCE};
use overwatch_core::enums::WaypointKind;
use overwatch_core::error::{require_positive, Result, TerrainError};
use overwatch_core::types::{bearing_deg, bearing_delta, Position, Waypoint};
use overwatch_terrain::TerrainSession;

use crate::sampling::ring_points;

/// Road-following result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadPath {
    pub waypoints: Vec<Waypoint>,
    /// Direct legs inserted where no road connection exists.
    pub off_road_jumps: usize,
    /// False when the path fell back to a straight line.
    pub used_roads: bool,
}

/// A threat the returned path still enters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreatExposure {
    /// Index into the caller's threat list.
    pub threat: usize,
    /// Closest horizontal approach of the path to the threat (meters).
    pub min_distance: f64,
    /// Range plus safety margin (meters).
    pub required: f64,
}

/// Threat-avoiding result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatPath {
    pub waypoints: Vec<Waypoint>,
    /// Deflection passes performed.
    pub iterations: usize,
    /// True when no threat disk is entered.
    pub converged: bool,
    pub residual: Vec<ThreatExposure>,
}

/// Waypoint closer to the ground than requested.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClearanceWarning {
    pub index: usize,
    /// Height above terrain (meters).
    pub clearance: f64,
}

/// Path generators over one terrain session.
#[derive(Debug, Clone, Copy)]
pub struct PathPlanner<'a> {
    session: &'a TerrainSession,
}

impl<'a> PathPlanner<'a> {
    pub fn new(session: &'a TerrainSession) -> Self {
        Self { session }
    }

    fn ground_waypoint(&self, p: DVec2, kind: WaypointKind) -> Waypoint {
        Waypoint::new(Position::from_horizontal(p, self.session.ground(p)), kind)
    }

    fn agl_waypoint(&self, p: DVec2, altitude_agl: f64, kind: WaypointKind) -> Waypoint {
        Waypoint::new(Position::from_horizontal(p, self.session.ground(p) + altitude_agl), kind)
    }

    /// Route along the road network between the roads nearest `start` and `end`.
    ///
    /// Ends that are not within `road_snap_distance` of a road (or a map
    /// without roads) give a straight line. Disconnected roads get one
    /// direct jump between the snap points. Off-road legs longer than
    /// `max_off_road_distance` are split with `OffRoad` filler points.
    pub fn road_following_path(
        &self,
        start: DVec2,
        end: DVec2,
        road_snap_distance: f64,
        max_off_road_distance: f64,
    ) -> Result<RoadPath> {
        if !(road_snap_distance.is_finite() && road_snap_distance >= 0.0) {
            return Err(TerrainError::invalid(
                "road_snap_distance",
                format!("must be >= 0, got {road_snap_distance}"),
            ));
        }
        require_positive("max_off_road_distance", max_off_road_distance)?;

        let surfaces = self.session.surfaces();
        let snaps = (
            surfaces.nearest_road_within(start.x, start.y, road_snap_distance),
            surfaces.nearest_road_within(end.x, end.y, road_snap_distance),
        );

        // (point, kind, leg from previous point is off-road)
        let mut legs: Vec<(DVec2, WaypointKind, bool)> = vec![(start, WaypointKind::Endpoint, false)];
        let mut jumps = 0;
        let used_roads = match snaps {
            (Some(from), Some(to)) => {
                legs.push((from.point, WaypointKind::Road, true));
                match self.session.road_graph().route(&from, &to) {
                    Some(route) => {
                        legs.extend(route.into_iter().map(|p| (p, WaypointKind::Road, false)));
                    }
                    None => {
                        warn!(
                            from = from.segment,
                            to = to.segment,
                            "roads not connected, inserting direct jump"
                        );
                        jumps += 1;
                        legs.push((to.point, WaypointKind::Road, true));
                    }
                }
                legs.push((end, WaypointKind::Endpoint, true));
                true
            }
            _ => {
                debug!("no road within snap distance, using straight line");
                jumps += 1;
                legs.push((end, WaypointKind::Endpoint, true));
                false
            }
        };

        let mut points: Vec<(DVec2, WaypointKind)> = Vec::with_capacity(legs.len());
        for (p, kind, off_road) in legs {
            let Some(&(prev, prev_kind)) = points.last() else {
                points.push((p, kind));
                continue;
            };
            if prev.distance(p) < PATH_DEDUP_DISTANCE {
                if kind == WaypointKind::Endpoint && prev_kind != WaypointKind::Endpoint {
                    if let Some(last) = points.last_mut() {
                        *last = (p, kind);
                    }
                }
                continue;
            }
            if off_road {
                let pieces = (prev.distance(p) / max_off_road_distance).ceil() as usize;
                for k in 1..pieces {
                    points.push((prev.lerp(p, k as f64 / pieces as f64), WaypointKind::OffRoad));
                }
            }
            points.push((p, kind));
        }

        Ok(RoadPath {
            waypoints: points
                .into_iter()
                .map(|(p, kind)| self.ground_waypoint(p, kind))
                .collect(),
            off_road_jumps: jumps,
            used_roads,
        })
    }

    /// `num_waypoints` evenly spaced points at `altitude_agl`, with the
    /// altitude profile low-passed by `smoothness` in [0, 1].
    ///
    /// 0 tracks terrain exactly; 1 filters heavily. The filter runs forward
    /// then backward so it adds no lag. Endpoints keep their exact AGL and
    /// no point goes below terrain.
    pub fn terrain_following_path(
        &self,
        start: DVec2,
        end: DVec2,
        num_waypoints: usize,
        altitude_agl: f64,
        smoothness: f64,
    ) -> Result<Vec<Waypoint>> {
        if num_waypoints < 2 {
            return Err(TerrainError::invalid(
                "num_waypoints",
                format!("must be at least 2, got {num_waypoints}"),
            ));
        }
        if !(0.0..=1.0).contains(&smoothness) {
            return Err(TerrainError::invalid(
                "smoothness",
                format!("must be within [0, 1], got {smoothness}"),
            ));
        }

        let n = num_waypoints;
        let points: Vec<DVec2> = (0..n)
            .map(|i| start.lerp(end, i as f64 / (n - 1) as f64))
            .collect();
        let ground: Vec<f64> = points.iter().map(|p| self.session.ground(*p)).collect();
        let raw: Vec<f64> = ground.iter().map(|g| g + altitude_agl).collect();

        let alpha = 1.0 - 0.9 * smoothness;
        let mut forward = raw.clone();
        for i in 1..n {
            forward[i] = alpha * raw[i] + (1.0 - alpha) * forward[i - 1];
        }
        let mut smoothed = forward.clone();
        for i in (0..n - 1).rev() {
            smoothed[i] = alpha * forward[i] + (1.0 - alpha) * smoothed[i + 1];
        }
        smoothed[0] = raw[0];
        smoothed[n - 1] = raw[n - 1];

        Ok(points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let kind = if i == 0 || i == n - 1 {
                    WaypointKind::Endpoint
                } else {
                    WaypointKind::Terrain
                };
                Waypoint::new(Position::from_horizontal(*p, smoothed[i].max(ground[i])), kind)
            })
            .collect())
    }

    /// Straight path bent around threat disks of radius `range + safety_margin`.
    ///
    /// Each pass finds the first segment entering a disk and replaces it by
    /// tangent legs wrapping the disk on the shorter side. Wide wraps get
    /// more than one corner so no corner strays far from the disk. Equal
    /// sides go to the one whose first leg stays closer to the original
    /// bearing, then to the left. Segments with an endpoint inside a disk
    /// cannot be fixed and are left for `residual`. Stops after
    /// `max_iterations` passes.
    pub fn threat_avoiding_path(
        &self,
        start: DVec2,
        end: DVec2,
        threats: &[Threat],
        safety_margin: f64,
        altitude_agl: f64,
        max_iterations: usize,
    ) -> Result<ThreatPath> {
        if !(safety_margin.is_finite() && safety_margin >= 0.0) {
            return Err(TerrainError::invalid(
                "safety_margin",
                format!("must be >= 0, got {safety_margin}"),
            ));
        }

        let disks: Vec<(DVec2, f64)> = threats
            .iter()
            .map(|t| (t.position, t.keep_out_radius(safety_margin)))
            .collect();
        let mut points: Vec<(DVec2, WaypointKind)> =
            vec![(start, WaypointKind::Endpoint), (end, WaypointKind::Endpoint)];

        let mut iterations = 0;
        while iterations < max_iterations {
            let Some((seg, disk)) = first_violation(&points, &disks) else {
                break;
            };
            let (a, b) = (points[seg].0, points[seg + 1].0);
            let (center, radius) = disks[disk];
            let detour = detour_points(a, b, center, radius * DETOUR_CLEARANCE_FACTOR);
            points.splice(seg + 1..seg + 1, detour.into_iter().map(|p| (p, WaypointKind::Detour)));
            iterations += 1;
        }
        if iterations == max_iterations && first_violation(&points, &disks).is_some() {
            warn!(max_iterations, "threat avoidance hit its iteration bound");
        }

        let residual: Vec<ThreatExposure> = disks
            .iter()
            .enumerate()
            .filter_map(|(i, &(center, required))| {
                let min_distance = polyline_distance(&points, center);
                (min_distance < required - 1e-6).then_some(ThreatExposure {
                    threat: i,
                    min_distance,
                    required,
                })
            })
            .collect();

        Ok(ThreatPath {
            waypoints: points
                .into_iter()
                .map(|(p, kind)| self.agl_waypoint(p, altitude_agl, kind))
                .collect(),
            iterations,
            converged: residual.is_empty(),
            residual,
        })
    }

    /// Waypoints whose height above terrain is below `min_clearance`.
    pub fn validate_clearance(&self, waypoints: &[Waypoint], min_clearance: f64) -> Vec<ClearanceWarning> {
        waypoints
            .iter()
            .enumerate()
            .filter_map(|(index, w)| {
                let clearance = w.position.y - self.session.ground(w.position.horizontal());
                (clearance < min_clearance).then_some(ClearanceWarning { index, clearance })
            })
            .collect()
    }

    /// Loiter circle of `count` points at `altitude_agl`, clockwise from north.
    pub fn orbit_path(&self, center: DVec2, radius: f64, altitude_agl: f64, count: usize) -> Result<Vec<Waypoint>> {
        require_positive("radius", radius)?;
        if count < 3 {
            return Err(TerrainError::invalid("count", format!("orbit needs at least 3 points, got {count}")));
        }
        Ok(ring_points(center, radius, count)
            .into_iter()
            .map(|p| self.agl_waypoint(p, altitude_agl, WaypointKind::Orbit))
            .collect())
    }
}

/// Reduce a path to `count` waypoints, keeping both ends and even spacing by index.
pub fn thin_waypoints(waypoints: &[Waypoint], count: usize) -> Vec<Waypoint> {
    if count >= waypoints.len() || waypoints.len() < 2 {
        return waypoints.to_vec();
    }
    if count < 2 {
        return waypoints[..count.min(1)].to_vec();
    }
    let last = waypoints.len() - 1;
    (0..count)
        .map(|i| waypoints[(i * last + (count - 1) / 2) / (count - 1)])
        .collect()
}

/// First (segment, disk) pair where a segment with both ends outside a
/// disk passes through it.
fn first_violation(points: &[(DVec2, WaypointKind)], disks: &[(DVec2, f64)]) -> Option<(usize, usize)> {
    for seg in 0..points.len().saturating_sub(1) {
        let (a, b) = (points[seg].0, points[seg + 1].0);
        for (i, &(center, radius)) in disks.iter().enumerate() {
            if a.distance(center) <= radius || b.distance(center) <= radius {
                continue;
            }
            if segment_distance(a, b, center) < radius - 1e-6 {
                return Some((seg, i));
            }
        }
    }
    None
}

/// Corners of the tangent wrap from `a` to `b` on the shorter side of the disk.
fn detour_points(a: DVec2, b: DVec2, center: DVec2, radius: f64) -> Vec<DVec2> {
    let dir = (b - a).try_normalize().unwrap_or(DVec2::Y);
    let left = DVec2::new(-dir.y, dir.x);
    let original = bearing_deg(a, b);

    let candidates = [1.0, -1.0].map(|side| {
        let corners = wrap_corners(a, b, center, radius, side)
            .unwrap_or_else(|| vec![center + left * side * radius * 1.5]);
        let mut length = 0.0;
        let mut prev = a;
        for &p in corners.iter().chain(std::iter::once(&b)) {
            length += prev.distance(p);
            prev = p;
        }
        let deviation = bearing_delta(bearing_deg(a, corners[0]), original);
        (corners, length, deviation)
    });

    let [l, r] = candidates;
    let pick_left = if (l.1 - r.1).abs() > 1e-9 {
        l.1 < r.1
    } else {
        l.2 <= r.2 + 1e-9
    };
    if pick_left {
        l.0
    } else {
        r.0
    }
}

/// Corners of a polyline from `a` to `b` whose legs are all tangent to the
/// circle, passing it on `side` (+1 = left of a->b).
///
/// The arc between the two touch points is cut into equal slices of at
/// most [`DETOUR_MAX_WRAP_DEG`]. Each corner is where the tangents at the
/// ends of one slice meet. None if either end is inside the circle.
fn wrap_corners(a: DVec2, b: DVec2, center: DVec2, radius: f64, side: f64) -> Option<Vec<DVec2>> {
    let na = touch_normal(a, center, radius, -side)?;
    let nb = touch_normal(b, center, radius, side)?;
    // Passing on the left circles the center clockwise.
    let turn = na.perp_dot(nb).atan2(na.dot(nb));
    let sweep = (turn * -side).rem_euclid(TAU);
    let slices = (sweep / DETOUR_MAX_WRAP_DEG.to_radians()).ceil().max(1.0);
    let half = sweep / (2.0 * slices);
    let reach = radius / half.cos();
    Some(
        (0..slices as usize)
            .map(|j| center + DVec2::from_angle(-side * half * (2 * j + 1) as f64).rotate(na) * reach)
            .collect(),
    )
}

/// Unit normal at the point where a tangent from `from` touches the circle,
/// rotated from the center-to-`from` direction by `turn` (+1 = counterclockwise).
fn touch_normal(from: DVec2, center: DVec2, radius: f64, turn: f64) -> Option<DVec2> {
    let v = from - center;
    let dist = v.length();
    if dist <= radius {
        return None;
    }
    let alpha = (radius / dist).acos() * turn;
    Some(DVec2::from_angle(alpha).rotate(v / dist))
}

fn segment_distance(a: DVec2, b: DVec2, p: DVec2) -> f64 {
    let d = b - a;
    let len2 = d.length_squared();
    if len2 < f64::EPSILON {
        return a.distance(p);
    }
    let t = ((p - a).dot(d) / len2).clamp(0.0, 1.0);
    (a + d * t).distance(p)
}

fn polyline_distance(points: &[(DVec2, WaypointKind)], p: DVec2) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => only.0.distance(p),
        _ => points
            .windows(2)
            .map(|w| segment_distance(w[0].0, w[1].0, p))
            .fold(f64::INFINITY, f64::min),
    }
}
