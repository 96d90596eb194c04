//! Analysis configuration.
//!
//! Every field has a default from [`crate::constants`], so a config file only
//! needs to name what it overrides.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{Result, TerrainError};

/// Session-wide tuning. Fixed once a session is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Distance within which placements snap to a road (meters).
    pub road_snap_distance: f64,
    /// Grazing tolerance for sight lines (meters).
    pub los_epsilon: f64,
    /// Apply the 4/3-Earth curvature drop to sight lines.
    pub earth_curvature: bool,
    /// Finite-difference step for terrain normals (meters).
    pub normal_delta: f64,
    /// Bucket size of the static spatial index (meters).
    pub spatial_cell_size: f64,
    pub search: SearchConfig,
}

/// Neighborhood geometry for the position searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Points per side of the flatness patch.
    pub patch_points: usize,
    pub annulus_inner: f64,
    pub annulus_outer: f64,
    pub annulus_rings: usize,
    pub ring_samples: usize,
    /// Neighborhood radius for concealment depth and roughness (meters).
    pub concealment_radius: f64,
    /// Ring radius for the defilade test (meters).
    pub defilade_radius: f64,
    pub observer_eye_height: f64,
    pub target_eye_height: f64,
    pub los_samples: usize,
    pub cross_section_samples: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            road_snap_distance: ROAD_SNAP_DISTANCE,
            los_epsilon: LOS_EPSILON,
            earth_curvature: false,
            normal_delta: NORMAL_DELTA,
            spatial_cell_size: SPATIAL_CELL_SIZE,
            search: SearchConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            patch_points: FLATNESS_PATCH_POINTS,
            annulus_inner: ANNULUS_INNER_RADIUS,
            annulus_outer: ANNULUS_OUTER_RADIUS,
            annulus_rings: ANNULUS_RINGS,
            ring_samples: ANNULUS_RING_SAMPLES,
            concealment_radius: CONCEALMENT_RADIUS,
            defilade_radius: DEFILADE_RADIUS,
            observer_eye_height: OBSERVER_EYE_HEIGHT,
            target_eye_height: TARGET_EYE_HEIGHT,
            los_samples: LOS_SAMPLES,
            cross_section_samples: CROSS_SECTION_SAMPLES,
        }
    }
}

impl AnalysisConfig {
    /// Parse from JSON and validate.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !non_negative(self.road_snap_distance) {
            return Err(TerrainError::Config(
                "road_snap_distance must be non-negative".into(),
            ));
        }
        if !non_negative(self.los_epsilon) {
            return Err(TerrainError::Config("los_epsilon must be non-negative".into()));
        }
        if !positive(self.normal_delta) {
            return Err(TerrainError::Config("normal_delta must be positive".into()));
        }
        if !positive(self.spatial_cell_size) {
            return Err(TerrainError::Config(
                "spatial_cell_size must be positive".into(),
            ));
        }
        self.search.validate()
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.patch_points < 2 {
            return Err(TerrainError::Config("patch_points must be at least 2".into()));
        }
        if !positive(self.annulus_inner) || self.annulus_outer < self.annulus_inner {
            return Err(TerrainError::Config(format!(
                "annulus must satisfy 0 < inner <= outer, got {}..{}",
                self.annulus_inner, self.annulus_outer
            )));
        }
        if self.annulus_rings == 0 || self.ring_samples == 0 {
            return Err(TerrainError::Config("annulus sampling needs rings and samples".into()));
        }
        if !positive(self.concealment_radius) || !positive(self.defilade_radius) {
            return Err(TerrainError::Config("neighborhood radii must be positive".into()));
        }
        if self.los_samples == 0 {
            return Err(TerrainError::Config("los_samples must be at least 1".into()));
        }
        if self.cross_section_samples < 3 {
            return Err(TerrainError::Config(
                "cross_section_samples must be at least 3".into(),
            ));
        }
        Ok(())
    }
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

fn non_negative(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}
