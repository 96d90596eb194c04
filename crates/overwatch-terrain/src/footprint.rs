//! Base footprints: polygons that flatten terrain to a fixed height.

use glam::DVec2;

use overwatch_core::types::bearing_dir;

/// Flattened area of a base.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseFootprint {
    pub id: u32,
    pub name: String,
    pub polygon: Vec<DVec2>,
    /// Terrain height reported anywhere inside the polygon (meters).
    pub flatten_height: f64,
    bbox_min: DVec2,
    bbox_max: DVec2,
}

impl BaseFootprint {
    pub fn new(id: u32, name: impl Into<String>, polygon: Vec<DVec2>, flatten_height: f64) -> Self {
        let (bbox_min, bbox_max) = polygon.iter().fold(
            (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
            |(lo, hi), p| (lo.min(*p), hi.max(*p)),
        );
        Self {
            id,
            name: name.into(),
            polygon,
            flatten_height,
            bbox_min,
            bbox_max,
        }
    }

    /// Rectangle given in a yaw-rotated local (right, forward) frame,
    /// grown by `margin` on every side.
    #[allow(clippy::too_many_arguments)]
    pub fn oriented_rect(
        id: u32,
        name: impl Into<String>,
        center: DVec2,
        yaw: f64,
        local_min: DVec2,
        local_max: DVec2,
        margin: f64,
        flatten_height: f64,
    ) -> Self {
        let lo = local_min - DVec2::splat(margin);
        let hi = local_max + DVec2::splat(margin);
        let forward = bearing_dir(yaw);
        let right = DVec2::new(forward.y, -forward.x);
        let corners = [
            DVec2::new(lo.x, lo.y),
            DVec2::new(hi.x, lo.y),
            DVec2::new(hi.x, hi.y),
            DVec2::new(lo.x, hi.y),
        ];
        let polygon = corners
            .iter()
            .map(|c| center + right * c.x + forward * c.y)
            .collect();
        Self::new(id, name, polygon, flatten_height)
    }

    pub fn contains(&self, p: DVec2) -> bool {
        if p.x < self.bbox_min.x || p.x > self.bbox_max.x || p.y < self.bbox_min.y || p.y > self.bbox_max.y {
            return false;
        }
        point_in_polygon(p, &self.polygon)
    }

    pub fn centroid(&self) -> DVec2 {
        if self.polygon.is_empty() {
            return DVec2::ZERO;
        }
        self.polygon.iter().copied().sum::<DVec2>() / self.polygon.len() as f64
    }
}

/// Even-odd ray casting test.
pub fn point_in_polygon(p: DVec2, polygon: &[DVec2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
