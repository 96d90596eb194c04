//! Line-of-sight and visible-area computation with terrain occlusion.
//!
//! Sight lines are sampled at evenly spaced interior points. Optional Earth
//! curvature uses the standard 4/3 effective radius for refraction.

use glam::DVec2;
use rayon::prelude::*;

use overwatch_core::config::AnalysisConfig;
use overwatch_core::constants::EFFECTIVE_EARTH_RADIUS;
use overwatch_core::enums::{Metric, SurfaceType};
use overwatch_core::error::{require_nonzero, require_positive, Result, TerrainError};
use overwatch_core::state::PositionCandidate;
use overwatch_core::types::{bearing_dir, Position, Rotation};

use crate::grid::HeightField;

/// Sight-line queries over one height field.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityEngine<'a> {
    field: &'a HeightField,
    epsilon: f64,
    earth_curvature: bool,
}

impl<'a> VisibilityEngine<'a> {
    pub fn new(field: &'a HeightField, epsilon: f64, earth_curvature: bool) -> Self {
        Self {
            field,
            epsilon,
            earth_curvature,
        }
    }

    pub fn from_config(field: &'a HeightField, config: &AnalysisConfig) -> Self {
        Self::new(field, config.los_epsilon, config.earth_curvature)
    }

    /// Ground height, falling back to the raster minimum off the map.
    fn ground(&self, p: DVec2) -> f64 {
        self.field.sample_height(p.x, p.y, self.field.min_height())
    }

    /// Check line of sight between two ground points with eye heights above terrain.
    ///
    /// Exactly symmetric: swapping the endpoints together with their eye
    /// heights gives the same answer.
    pub fn line_of_sight(&self, p1: DVec2, p2: DVec2, eye1: f64, eye2: f64, samples: usize) -> bool {
        let a = Position::from_horizontal(p1, self.ground(p1) + eye1);
        let b = Position::from_horizontal(p2, self.ground(p2) + eye2);
        self.line_of_sight_between(&a, &b, samples)
    }

    /// Check line of sight between two absolute positions.
    pub fn line_of_sight_between(&self, from: &Position, to: &Position, samples: usize) -> bool {
        let (a, b) = if canonical_order(from, to) { (from, to) } else { (to, from) };
        self.ray_is_clear(a, b, samples)
    }

    fn ray_is_clear(&self, from: &Position, to: &Position, samples: usize) -> bool {
        let start = from.horizontal();
        let delta = to.horizontal() - start;
        let horiz_dist = delta.length();
        let dy = to.y - from.y;

        for i in 1..=samples {
            let t = i as f64 / (samples + 1) as f64;
            let sample = start + delta * t;
            let ray_height = from.y + dy * t;

            let earth_drop = if self.earth_curvature {
                let d_from = horiz_dist * t;
                let d_to = horiz_dist * (1.0 - t);
                (d_from * d_to) / (2.0 * EFFECTIVE_EARTH_RADIUS)
            } else {
                0.0
            };

            let effective_terrain = self.ground(sample) - earth_drop;
            if effective_terrain - ray_height > self.epsilon {
                return false;
            }
        }

        true
    }

    /// Ground points visible from an observer, swept by bearing then range.
    ///
    /// Directions run from 0° in `angular_resolution` steps; each carries
    /// `range_samples` evenly spaced ranges up to `max_range`. Points off the
    /// raster are skipped. Metrics: `Distance`, `Bearing`.
    pub fn visible_area(
        &self,
        observer: DVec2,
        observer_height_offset: f64,
        max_range: f64,
        angular_resolution: f64,
        range_samples: usize,
    ) -> Result<Vec<PositionCandidate>> {
        require_positive("max_range", max_range)?;
        require_positive("angular_resolution", angular_resolution)?;
        require_nonzero("range_samples", range_samples)?;
        if angular_resolution > 360.0 {
            return Err(TerrainError::invalid(
                "angular_resolution",
                format!("must be at most 360°, got {angular_resolution}"),
            ));
        }

        let directions = (360.0 / angular_resolution).ceil() as usize;
        let cell = self.field.cell_size();

        let per_direction: Vec<Vec<PositionCandidate>> = (0..directions)
            .into_par_iter()
            .map(|k| {
                let bearing = k as f64 * angular_resolution;
                let dir = bearing_dir(bearing);
                (1..=range_samples)
                    .filter_map(|j| {
                        let distance = max_range * j as f64 / range_samples as f64;
                        let target = observer + dir * distance;
                        let ground = self.field.height_at(target.x, target.y)?;
                        let samples = ((distance / cell).ceil() as usize).max(1);
                        self.line_of_sight(observer, target, observer_height_offset, 0.0, samples)
                            .then(|| PositionCandidate {
                                position: Position::from_horizontal(target, ground),
                                rotation: Rotation::default(),
                                surface: SurfaceType::Terrain,
                                metrics: Default::default(),
                            }
                            .with_metric(Metric::Distance, distance)
                            .with_metric(Metric::Bearing, bearing))
                    })
                    .collect()
            })
            .collect();

        Ok(per_direction.into_iter().flatten().collect())
    }
}

/// True when `a` sorts before or equal to `b` by (x, z, y).
fn canonical_order(a: &Position, b: &Position) -> bool {
    a.x.total_cmp(&b.x)
        .then(a.z.total_cmp(&b.z))
        .then(a.y.total_cmp(&b.y))
        .is_le()
}
