//! Tactical analysis for overwatch.
//!
//! Candidate position searches, path planning, weighted position scoring,
//! and formation layouts on top of a terrain session.

pub use overwatch_terrain as terrain;

pub mod formation;
pub mod paths;
pub mod sampling;
pub mod scoring;
pub mod search;

pub use formation::{formation_offsets, generate_formation_points};
pub use paths::{thin_waypoints, ClearanceWarning, PathPlanner, RoadPath, ThreatExposure, ThreatPath};
pub use sampling::SearchArea;
pub use scoring::{find_best_positions, score_position, BestPositionQuery, CriterionWeights, Scorer};
pub use search::PositionSearch;

#[cfg(test)]
mod tests;
