//! Terrain system for overwatch.
//!
//! Heightmap sampling, orientation calibration, surface resolution,
//! road routing, and line-of-sight calculation.

pub use overwatch_core as core;

pub mod calibration;
pub mod footprint;
pub mod grid;
pub mod los;
pub mod orientation;
pub mod roads;
pub mod session;
pub mod spatial;
pub mod surface;

// Re-export key types for convenience.
pub use calibration::{calibrate_orientation, fit_linear_correction, OrientationFit};
pub use footprint::BaseFootprint;
pub use grid::{HeightField, LinearCorrection, RasterHeader};
pub use los::VisibilityEngine;
pub use roads::{RoadGraph, RoadHit};
pub use session::TerrainSession;
pub use surface::{normal_to_rotation, SurfaceResolver};
