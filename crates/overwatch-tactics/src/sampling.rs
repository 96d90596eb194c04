//! Candidate point generation inside a search disk.

use std::f64::consts::{PI, TAU};

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use overwatch_core::enums::SamplePattern;
use overwatch_core::error::{require_nonzero, require_positive, Result};
use overwatch_core::types::bearing_dir;

/// Disk of candidate points around a center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchArea {
    pub center: DVec2,
    /// Disk radius (meters).
    pub radius: f64,
    /// Approximate number of candidates.
    pub samples: usize,
    pub pattern: SamplePattern,
    /// RNG seed for determinism. Same seed = same candidates.
    pub seed: u64,
}

impl SearchArea {
    pub fn new(center: DVec2, radius: f64, samples: usize) -> Self {
        Self {
            center,
            radius,
            samples,
            pattern: SamplePattern::Grid,
            seed: 42,
        }
    }

    pub fn jittered(mut self, seed: u64) -> Self {
        self.pattern = SamplePattern::Jittered;
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("radius", self.radius)?;
        require_nonzero("samples", self.samples)
    }

    /// Candidate points in a fixed order.
    ///
    /// `Grid` yields a square lattice clipped to the disk (always including
    /// the center), row by row. `Jittered` yields exactly `samples`
    /// area-uniform points from the seeded RNG.
    pub fn points(&self) -> Result<Vec<DVec2>> {
        self.validate()?;
        Ok(match self.pattern {
            SamplePattern::Grid => self.grid_points(),
            SamplePattern::Jittered => self.jittered_points(),
        })
    }

    fn grid_points(&self) -> Vec<DVec2> {
        let step = self.radius * (PI / self.samples as f64).sqrt();
        let k = (self.radius / step).floor() as i64;
        let mut points = Vec::new();
        for j in -k..=k {
            for i in -k..=k {
                let offset = DVec2::new(i as f64 * step, j as f64 * step);
                if offset.length() <= self.radius {
                    points.push(self.center + offset);
                }
            }
        }
        points
    }

    fn jittered_points(&self) -> Vec<DVec2> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        (0..self.samples)
            .map(|_| {
                let angle = rng.gen::<f64>() * TAU;
                let distance = self.radius * rng.gen::<f64>().sqrt();
                self.center + DVec2::new(angle.cos(), angle.sin()) * distance
            })
            .collect()
    }
}

/// `count` points on a circle, starting due north and running clockwise.
pub fn ring_points(center: DVec2, radius: f64, count: usize) -> Vec<DVec2> {
    (0..count)
        .map(|i| center + bearing_dir(360.0 * i as f64 / count as f64) * radius)
        .collect()
}
