//! Result and requirement records exchanged with callers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{Criterion, Metric, SurfaceType};
use crate::types::{Position, Rotation};

/// Outcome of resolving a placement at a horizontal point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub position: Position,
    pub rotation: Rotation,
    pub surface: SurfaceType,
    /// Name of the hosting structure for rooftop placements.
    pub structure: Option<String>,
}

/// A ranked search result. Each search documents the metrics it fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionCandidate {
    pub position: Position,
    pub rotation: Rotation,
    pub surface: SurfaceType,
    pub metrics: BTreeMap<Metric, f64>,
}

impl PositionCandidate {
    pub fn from_placement(placement: Placement) -> Self {
        Self {
            position: placement.position,
            rotation: placement.rotation,
            surface: placement.surface,
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, metric: Metric, value: f64) -> Self {
        self.metrics.insert(metric, value);
        self
    }

    /// Metric value, or 0.0 when the search did not set it.
    pub fn metric(&self, metric: Metric) -> f64 {
        self.metrics.get(&metric).copied().unwrap_or(0.0)
    }
}

/// Hard constraints for scoring a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionRequirements {
    /// Minimum terrain altitude (meters).
    pub min_altitude: f64,
    /// Maximum terrain altitude (meters).
    pub max_altitude: f64,
    /// Maximum slope (degrees).
    pub max_slope: f64,
    pub requires_road_access: bool,
    /// Maximum distance to the nearest road (meters).
    pub max_road_distance: f64,
    /// Accepted threat exposure in [0, 1].
    pub threat_tolerance: f64,
    /// Minimum distance to obstacle structures (meters), 0 to skip.
    pub min_obstacle_clearance: f64,
}

impl Default for PositionRequirements {
    fn default() -> Self {
        Self {
            min_altitude: 0.0,
            max_altitude: 3000.0,
            max_slope: 15.0,
            requires_road_access: false,
            max_road_distance: 5000.0,
            threat_tolerance: 0.5,
            min_obstacle_clearance: 0.0,
        }
    }
}

/// Weighted score of one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub total: f64,
    pub breakdown: BTreeMap<Criterion, f64>,
    pub meets_requirements: bool,
    /// Human-readable reason for every failed constraint.
    pub issues: Vec<String>,
}

impl ScoreResult {
    pub fn criterion(&self, c: Criterion) -> f64 {
        self.breakdown.get(&c).copied().unwrap_or(0.0)
    }
}

/// A scored position accepted by a best-position search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPosition {
    pub candidate: PositionCandidate,
    pub score: ScoreResult,
}
