//! Smart placement across terrain, roads, and rooftops.
//!
//! Priority at a point: static prefab roof, then city block roof, then road
//! within snap distance, then bare terrain. Only spawnable structures host
//! placements; the rest are reported as obstructions.

use glam::{DQuat, DVec2, DVec3, EulerRot};

use overwatch_core::components::{RoadSegment, Structure};
use overwatch_core::enums::{StructureKind, SurfaceType};
use overwatch_core::state::Placement;
use overwatch_core::types::{Position, Rotation};

use crate::grid::HeightField;
use crate::roads::RoadHit;
use crate::spatial::SpatialIndex;

#[derive(Debug, Clone)]
pub struct SurfaceResolver {
    roads: Vec<RoadSegment>,
    structures: Vec<Structure>,
    road_index: SpatialIndex,
    structure_index: SpatialIndex,
    snap_distance: f64,
    normal_delta: f64,
}

impl SurfaceResolver {
    pub fn new(
        roads: Vec<RoadSegment>,
        structures: Vec<Structure>,
        snap_distance: f64,
        normal_delta: f64,
        cell_size: f64,
    ) -> Self {
        let road_index = SpatialIndex::build(cell_size, roads.iter().map(RoadSegment::bounds));
        let structure_index = SpatialIndex::build(
            cell_size,
            structures.iter().map(|s| {
                let r = DVec2::splat(s.bounding_radius());
                (s.center - r, s.center + r)
            }),
        );
        Self {
            roads,
            structures,
            road_index,
            structure_index,
            snap_distance,
            normal_delta,
        }
    }

    pub fn roads(&self) -> &[RoadSegment] {
        &self.roads
    }

    pub fn structures(&self) -> &[Structure] {
        &self.structures
    }

    pub fn snap_distance(&self) -> f64 {
        self.snap_distance
    }

    /// Resolve the surface, height, and rotation for a unit at (x, z).
    pub fn resolve_placement(&self, field: &HeightField, x: f64, z: f64, yaw: f64) -> Placement {
        let p = DVec2::new(x, z);
        let ground = field.sample_height(x, z, field.min_height());

        if let Some(s) = self.highest_roof(p, StructureKind::StaticPrefab, ground) {
            return roof_placement(s, x, z, ground, SurfaceType::PrefabRoof);
        }
        if let Some(s) = self.highest_roof(p, StructureKind::CityBlock, ground) {
            return roof_placement(s, x, z, ground, SurfaceType::CityRoof);
        }

        let surface = if self.is_on_road(x, z, self.snap_distance) {
            SurfaceType::Road
        } else {
            SurfaceType::Terrain
        };
        let normal = field.normal_at(x, z, self.normal_delta);
        Placement {
            position: Position::new(x, ground, z),
            rotation: normal_to_rotation(normal, yaw),
            surface,
            structure: None,
        }
    }

    /// Highest spawnable roof of the given kind over `p`, first in table order on ties.
    fn highest_roof(&self, p: DVec2, kind: StructureKind, ground: f64) -> Option<&Structure> {
        let mut best: Option<&Structure> = None;
        for &i in self.structure_index.query_point(p) {
            let s = &self.structures[i];
            if s.kind != kind || !s.spawnable || !s.contains(p) {
                continue;
            }
            if best.is_none_or(|b| s.roof_altitude(ground) > b.roof_altitude(ground)) {
                best = Some(s);
            }
        }
        best
    }

    /// Obstacle structures covering (x, z).
    pub fn obstructions_at(&self, x: f64, z: f64) -> Vec<&Structure> {
        let p = DVec2::new(x, z);
        self.structure_index
            .query_point(p)
            .iter()
            .map(|&i| &self.structures[i])
            .filter(|s| !s.spawnable && s.contains(p))
            .collect()
    }

    /// Distance to the closest obstacle structure within `radius`.
    pub fn nearest_obstacle_distance(&self, x: f64, z: f64, radius: f64) -> Option<f64> {
        let p = DVec2::new(x, z);
        self.structure_index
            .query_radius(p, radius)
            .into_iter()
            .map(|i| &self.structures[i])
            .filter(|s| !s.spawnable)
            .map(|s| s.distance_to(p))
            .filter(|d| *d <= radius)
            .min_by(f64::total_cmp)
    }

    pub fn is_on_road(&self, x: f64, z: f64, tolerance: f64) -> bool {
        self.nearest_road_within(x, z, tolerance).is_some()
    }

    /// Closest road point within `radius`, lowest segment index on ties.
    pub fn nearest_road_within(&self, x: f64, z: f64, radius: f64) -> Option<RoadHit> {
        let p = DVec2::new(x, z);
        let mut best: Option<RoadHit> = None;
        for i in self.road_index.query_radius(p, radius) {
            let (point, _) = self.roads[i].closest_point(p);
            let distance = point.distance(p);
            if distance <= radius && best.is_none_or(|b| distance < b.distance) {
                best = Some(RoadHit {
                    point,
                    distance,
                    segment: i,
                });
            }
        }
        best
    }

    /// Closest road point anywhere on the map.
    pub fn nearest_road_point(&self, x: f64, z: f64) -> Option<RoadHit> {
        let p = DVec2::new(x, z);
        let mut best: Option<RoadHit> = None;
        for (i, road) in self.roads.iter().enumerate() {
            let (point, _) = road.closest_point(p);
            let distance = point.distance(p);
            if best.is_none_or(|b| distance < b.distance) {
                best = Some(RoadHit {
                    point,
                    distance,
                    segment: i,
                });
            }
        }
        best
    }
}

fn roof_placement(s: &Structure, x: f64, z: f64, ground: f64, surface: SurfaceType) -> Placement {
    Placement {
        position: Position::new(x, s.roof_altitude(ground), z),
        rotation: Rotation::from_yaw(s.yaw.rem_euclid(360.0)),
        surface,
        structure: Some(s.name.clone()),
    }
}

/// Rotation that tilts a unit onto a surface normal, then applies a heading.
///
/// Angles are read back in yaw-pitch-roll order; yaw and roll are wrapped
/// into [0, 360).
pub fn normal_to_rotation(normal: DVec3, yaw: f64) -> Rotation {
    let n = normal.try_normalize().unwrap_or(DVec3::Y);
    let tilt = DQuat::from_rotation_arc(DVec3::Y, n);
    let heading = DQuat::from_rotation_y(yaw.to_radians());
    let (y, x, z) = (tilt * heading).to_euler(EulerRot::YXZ);
    let clean = |a: f64| if a.abs() < 1e-9 { 0.0 } else { a };
    Rotation {
        pitch: clean(x.to_degrees()),
        yaw: clean(y.to_degrees()).rem_euclid(360.0),
        roll: clean(z.to_degrees()).rem_euclid(360.0),
    }
}
