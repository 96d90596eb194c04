//! Static overlay records supplied by the terrain-data loader, plus the
//! per-call `Threat` record.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::enums::StructureKind;
use crate::types::bearing_dir;

/// Straight road edge between two world points (x, z).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoadSegment {
    pub start: DVec2,
    pub end: DVec2,
}

impl RoadSegment {
    pub fn new(start: DVec2, end: DVec2) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Closest point on the segment to `p`, with its parameter in [0, 1].
    pub fn closest_point(&self, p: DVec2) -> (DVec2, f64) {
        let d = self.end - self.start;
        let len2 = d.length_squared();
        if len2 < f64::EPSILON {
            return (self.start, 0.0);
        }
        let t = ((p - self.start).dot(d) / len2).clamp(0.0, 1.0);
        (self.start + d * t, t)
    }

    pub fn distance_to(&self, p: DVec2) -> f64 {
        self.closest_point(p).0.distance(p)
    }

    /// Flatten a quadratic Bézier road (start, control, end) into `pieces` edges.
    pub fn from_bezier(start: DVec2, control: DVec2, end: DVec2, pieces: usize) -> Vec<RoadSegment> {
        let pieces = pieces.max(1);
        let point = |t: f64| {
            let a = 1.0 - t;
            start * (a * a) + control * (2.0 * a * t) + end * (t * t)
        };
        (0..pieces)
            .map(|i| {
                let t0 = i as f64 / pieces as f64;
                let t1 = (i + 1) as f64 / pieces as f64;
                RoadSegment::new(point(t0), point(t1))
            })
            .collect()
    }

    /// Axis-aligned bounds as (min, max).
    pub fn bounds(&self) -> (DVec2, DVec2) {
        (self.start.min(self.end), self.start.max(self.end))
    }
}

/// Yaw-oriented box: a city block or a static prefab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub name: String,
    pub kind: StructureKind,
    /// Horizontal center (x, z).
    pub center: DVec2,
    /// Heading of the local forward axis in degrees.
    pub yaw: f64,
    /// Half size along the local (right, forward) axes.
    pub half_extents: DVec2,
    /// Absolute for prefabs, relative to ground for city blocks.
    pub roof_height: f64,
    /// Spawnable roofs host placements; the rest are obstacles.
    pub spawnable: bool,
}

impl Structure {
    /// Position of `p` in the structure's local (right, forward) frame.
    pub fn to_local(&self, p: DVec2) -> DVec2 {
        let forward = bearing_dir(self.yaw);
        let right = DVec2::new(forward.y, -forward.x);
        let d = p - self.center;
        DVec2::new(d.dot(right), d.dot(forward))
    }

    pub fn contains(&self, p: DVec2) -> bool {
        let l = self.to_local(p);
        l.x.abs() <= self.half_extents.x && l.y.abs() <= self.half_extents.y
    }

    /// Distance from `p` to the box outline, zero inside.
    pub fn distance_to(&self, p: DVec2) -> f64 {
        let l = self.to_local(p).abs();
        (l - self.half_extents).max(DVec2::ZERO).length()
    }

    /// Radius of the bounding circle.
    pub fn bounding_radius(&self) -> f64 {
        self.half_extents.length()
    }

    /// Roof altitude given the ground height under the query point.
    pub fn roof_altitude(&self, ground: f64) -> f64 {
        match self.kind {
            StructureKind::StaticPrefab => self.roof_height,
            StructureKind::CityBlock => ground + self.roof_height,
        }
    }
}

/// Known threat: a circle of effective range. Supplied per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threat {
    /// Horizontal position (x, z).
    pub position: DVec2,
    /// Effective range (meters).
    pub range: f64,
    pub kind: Option<String>,
}

impl Threat {
    pub fn new(position: DVec2, range: f64) -> Self {
        Self {
            position,
            range,
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Radius of the forbidden disk for a given safety margin.
    pub fn keep_out_radius(&self, margin: f64) -> f64 {
        self.range + margin
    }
}
