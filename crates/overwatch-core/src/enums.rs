//! Enumeration types used throughout the engine.

use serde::{Deserialize, Serialize};

/// Which surface governs a placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceType {
    #[default]
    Terrain,
    Road,
    /// Roof of a procedural city block.
    CityRoof,
    /// Roof of a static prefab.
    PrefabRoof,
}

/// Kind of structure supplied to the surface resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructureKind {
    /// Roof height is relative to the ground under the query point.
    CityBlock,
    /// Roof height is an absolute altitude.
    StaticPrefab,
}

/// World-to-raster orientation. Chosen once per map.
///
/// `u` and `v` are the normalized world x and z. Each mode maps them to
/// normalized (column, row) raster coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrientationMode {
    /// col = u, row = v
    #[default]
    Identity,
    /// col = v, row = u
    Transpose,
    /// col = 1-u, row = v
    FlipU,
    /// col = v, row = 1-u
    TransposeFlipU,
    /// col = u, row = 1-v
    FlipV,
    /// col = 1-v, row = u
    TransposeFlipV,
    /// col = 1-u, row = 1-v
    FlipBoth,
    /// col = 1-v, row = 1-u
    TransposeFlipBoth,
}

impl OrientationMode {
    pub const ALL: [OrientationMode; 8] = [
        OrientationMode::Identity,
        OrientationMode::Transpose,
        OrientationMode::FlipU,
        OrientationMode::TransposeFlipU,
        OrientationMode::FlipV,
        OrientationMode::TransposeFlipV,
        OrientationMode::FlipBoth,
        OrientationMode::TransposeFlipBoth,
    ];

    /// Numeric mode index (0..8).
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|m| *m == self).unwrap_or(0)
    }
}

/// Path waypoint classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaypointKind {
    /// Start or end point supplied by the caller.
    #[default]
    Endpoint,
    /// Node on the road network.
    Road,
    /// Filler point on an off-road leg.
    OffRoad,
    /// Terrain-following sample.
    Terrain,
    /// Point inserted to route around a threat.
    Detour,
    /// Point on a loiter orbit.
    Orbit,
}

/// Candidate position sampling pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplePattern {
    /// Regular grid clipped to the search disk.
    #[default]
    Grid,
    /// Seeded uniform random points in the disk.
    Jittered,
}

/// Named metric attached to a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    Flatness,
    Slope,
    HeightAdvantage,
    SurroundingMean,
    Concealment,
    Depth,
    Roughness,
    RoadDistance,
    LineOfSight,
    DistanceToTarget,
    /// 1.0 when the position sits below its surrounding ring.
    Defilade,
    DefiladeDepth,
    Narrowness,
    Relief,
    Distance,
    Bearing,
    Score,
}

/// Scoring criterion, each normalized to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Criterion {
    AltitudeFit,
    SlopeFit,
    RoadAccess,
    ThreatExposure,
}

impl Criterion {
    pub const ALL: [Criterion; 4] = [
        Criterion::AltitudeFit,
        Criterion::SlopeFit,
        Criterion::RoadAccess,
        Criterion::ThreatExposure,
    ];
}

/// Weight profile for the position scorer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScorerProfile {
    #[default]
    Airbase,
    Defensive,
    TacticalOverwatch,
    TacticalAmbush,
    Logistics,
}

/// Unit formation layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormationType {
    #[default]
    Line,
    Wedge,
    Circle,
    Column,
    Box,
}
