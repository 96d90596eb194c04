//! World-to-raster orientation modes.
//!
//! World x and z are normalized by the map extent to `u` and `v` in [0, 1].
//! A mode picks one of the eight flips/transpositions of the unit square
//! that maps (u, v) onto normalized raster (column, row).

use overwatch_core::enums::OrientationMode;

/// Map normalized world (u, v) to normalized raster (col, row).
pub fn to_raster(mode: OrientationMode, u: f64, v: f64) -> (f64, f64) {
    match mode {
        OrientationMode::Identity => (u, v),
        OrientationMode::Transpose => (v, u),
        OrientationMode::FlipU => (1.0 - u, v),
        OrientationMode::TransposeFlipU => (v, 1.0 - u),
        OrientationMode::FlipV => (u, 1.0 - v),
        OrientationMode::TransposeFlipV => (1.0 - v, u),
        OrientationMode::FlipBoth => (1.0 - u, 1.0 - v),
        OrientationMode::TransposeFlipBoth => (1.0 - v, 1.0 - u),
    }
}

/// True when world x runs along raster rows.
pub fn is_transposed(mode: OrientationMode) -> bool {
    matches!(
        mode,
        OrientationMode::Transpose
            | OrientationMode::TransposeFlipU
            | OrientationMode::TransposeFlipV
            | OrientationMode::TransposeFlipBoth
    )
}

/// Inverse of [`to_raster`].
pub fn from_raster(mode: OrientationMode, col: f64, row: f64) -> (f64, f64) {
    match mode {
        OrientationMode::Identity => (col, row),
        OrientationMode::Transpose => (row, col),
        OrientationMode::FlipU => (1.0 - col, row),
        OrientationMode::TransposeFlipU => (1.0 - row, col),
        OrientationMode::FlipV => (col, 1.0 - row),
        OrientationMode::TransposeFlipV => (row, 1.0 - col),
        OrientationMode::FlipBoth => (1.0 - col, 1.0 - row),
        OrientationMode::TransposeFlipBoth => (1.0 - row, 1.0 - col),
    }
}
