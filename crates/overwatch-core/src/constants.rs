//! Engine constants and tuning parameters.

// --- Surfaces ---

/// Default distance within which a point snaps to a road (meters).
pub const ROAD_SNAP_DISTANCE: f64 = 10.0;

/// Finite-difference step for terrain normals (meters).
pub const NORMAL_DELTA: f64 = 1.0;

/// Default bucket size of the structure/road spatial index (meters).
pub const SPATIAL_CELL_SIZE: f64 = 256.0;

/// City density below this counts as open ground.
pub const CITY_DENSITY_THRESHOLD: f64 = 0.1;

// --- Line of sight ---

/// Terrain may exceed the sight ray by this much before it blocks (meters).
pub const LOS_EPSILON: f64 = 0.01;

/// Effective Earth radius accounting for standard atmospheric refraction (4/3 model).
pub const EFFECTIVE_EARTH_RADIUS: f64 = 6_371_000.0 * 4.0 / 3.0;

/// Default eye height of a ground observer (meters).
pub const OBSERVER_EYE_HEIGHT: f64 = 2.0;

/// Default eye height of a target (meters).
pub const TARGET_EYE_HEIGHT: f64 = 2.0;

/// Sample count for a single observation-post sight check.
pub const LOS_SAMPLES: usize = 64;

// --- Position search ---

/// Points per side of the flatness patch.
pub const FLATNESS_PATCH_POINTS: usize = 5;

/// Inner radius of the height-advantage annulus (meters).
pub const ANNULUS_INNER_RADIUS: f64 = 200.0;

/// Outer radius of the height-advantage annulus (meters).
pub const ANNULUS_OUTER_RADIUS: f64 = 400.0;

/// Number of rings sampled across the annulus.
pub const ANNULUS_RINGS: usize = 3;

/// Samples per ring of the annulus.
pub const ANNULUS_RING_SAMPLES: usize = 16;

/// Neighborhood radius for concealment depth and roughness (meters).
pub const CONCEALMENT_RADIUS: f64 = 100.0;

/// Ring radius used to decide defilade (meters).
pub const DEFILADE_RADIUS: f64 = 150.0;

/// Points sampled across a choke-point cross-section.
pub const CROSS_SECTION_SAMPLES: usize = 9;

// --- Concealment composite ---

/// Weight of depth below local mean.
pub const CONCEALMENT_DEPTH_WEIGHT: f64 = 0.5;

/// Weight of local roughness.
pub const CONCEALMENT_ROUGHNESS_WEIGHT: f64 = 0.3;

/// Weight of remoteness from roads.
pub const CONCEALMENT_REMOTENESS_WEIGHT: f64 = 0.2;

/// Depth at which the depth term saturates (meters).
pub const CONCEALMENT_DEPTH_NORM: f64 = 20.0;

/// Height standard deviation at which the roughness term saturates (meters).
pub const CONCEALMENT_ROUGHNESS_NORM: f64 = 10.0;

/// Road distance at which the remoteness term saturates (meters).
pub const CONCEALMENT_REMOTENESS_NORM: f64 = 2000.0;

// --- Calibration ---

/// Mean normalized error below which an orientation mode is accepted outright.
pub const ORIENTATION_EXACT_ERROR: f64 = 0.001;

/// Number of anchors needed before outlier trimming kicks in.
pub const CORRECTION_TRIM_MIN_ANCHORS: usize = 10;

/// Fraction of worst residuals discarded before the refit.
pub const CORRECTION_TRIM_FRACTION: f64 = 0.2;

// --- Paths ---

/// Consecutive path points closer than this are merged (meters).
pub const PATH_DEDUP_DISTANCE: f64 = 0.01;

/// Road endpoints within this distance are the same graph node (meters).
pub const ROAD_NODE_MERGE_DISTANCE: f64 = 1.0;

/// Default bound on threat deflection passes.
pub const THREAT_MAX_ITERATIONS: usize = 32;

/// Extra clearance added to the tangent detour so it clears the disk numerically.
pub const DETOUR_CLEARANCE_FACTOR: f64 = 1.0 + 1e-6;

/// Largest arc (degrees) one detour corner may cover. Wider wraps get
/// one corner per slice, so corners stay within 2x the disk radius.
pub const DETOUR_MAX_WRAP_DEG: f64 = 120.0;

// --- Scoring ---

/// Road distance limit forced by the logistics profile (meters).
pub const LOGISTICS_MAX_ROAD_DISTANCE: f64 = 2000.0;
