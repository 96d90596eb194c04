//! Orientation discovery and height correction from ground-truth anchors.
//!
//! Anchors are world positions whose altitude is known, typically road
//! vertices or surveyed base markers.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use overwatch_core::constants::{
    CORRECTION_TRIM_FRACTION, CORRECTION_TRIM_MIN_ANCHORS, ORIENTATION_EXACT_ERROR,
};
use overwatch_core::enums::OrientationMode;
use overwatch_core::types::Position;

use crate::grid::{HeightField, LinearCorrection};

/// Result of orientation discovery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationFit {
    pub mode: OrientationMode,
    /// Mean absolute error normalized by the header height range.
    pub mean_error: f64,
    /// False when no anchor could be evaluated and the header mode was kept.
    pub calibrated: bool,
}

/// Pick the orientation mode that best explains the anchors.
///
/// Modes are tried in index order. A mode within [`ORIENTATION_EXACT_ERROR`]
/// wins immediately; otherwise the lowest mean error wins, ties going to the
/// lower index.
pub fn calibrate_orientation(field: &HeightField, anchors: &[Position]) -> OrientationFit {
    let range = (field.header.max_height - field.header.min_height).abs().max(f64::EPSILON);
    let mut best: Option<(OrientationMode, f64)> = None;

    for mode in OrientationMode::ALL {
        let errors: Vec<f64> = anchors
            .iter()
            .filter_map(|a| field.raw_height_with(mode, a.x, a.z).map(|h| (h - a.y).abs() / range))
            .collect();
        if errors.is_empty() {
            continue;
        }
        let mean = errors.iter().sum::<f64>() / errors.len() as f64;
        debug!(mode = mode.index(), mean_error = mean, "orientation candidate");

        if mean < ORIENTATION_EXACT_ERROR {
            info!(mode = mode.index(), mean_error = mean, "orientation matched exactly");
            return OrientationFit {
                mode,
                mean_error: mean,
                calibrated: true,
            };
        }
        if best.is_none_or(|(_, e)| mean < e) {
            best = Some((mode, mean));
        }
    }

    match best {
        Some((mode, mean_error)) => {
            info!(mode = mode.index(), mean_error, "orientation selected");
            OrientationFit {
                mode,
                mean_error,
                calibrated: true,
            }
        }
        None => {
            warn!(
                anchors = anchors.len(),
                "no anchors inside the raster, keeping header orientation"
            );
            OrientationFit {
                mode: field.header.orientation,
                mean_error: f64::NAN,
                calibrated: false,
            }
        }
    }
}

/// Least-squares `y = scale * h + offset` from anchors, where `h` is the
/// uncorrected raster height under the field's current orientation.
///
/// With at least [`CORRECTION_TRIM_MIN_ANCHORS`] anchors the worst
/// [`CORRECTION_TRIM_FRACTION`] of residuals is dropped and the fit repeated.
/// Returns None with fewer than 3 usable anchors or no height variation.
pub fn fit_linear_correction(field: &HeightField, anchors: &[Position]) -> Option<LinearCorrection> {
    let pairs: Vec<(f64, f64)> = anchors
        .iter()
        .filter_map(|a| {
            field
                .raw_height_with(field.header.orientation, a.x, a.z)
                .map(|h| (h, a.y))
        })
        .collect();
    if pairs.len() < 3 {
        return None;
    }

    let first = least_squares(&pairs)?;
    if pairs.len() < CORRECTION_TRIM_MIN_ANCHORS {
        return Some(first);
    }

    let mut ranked: Vec<(f64, (f64, f64))> = pairs
        .iter()
        .map(|&(h, y)| ((first.apply(h) - y).abs(), (h, y)))
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
    let keep = ((ranked.len() as f64) * (1.0 - CORRECTION_TRIM_FRACTION)).ceil() as usize;
    let trimmed: Vec<(f64, f64)> = ranked.into_iter().take(keep.max(3)).map(|(_, p)| p).collect();

    let refit = least_squares(&trimmed).unwrap_or(first);
    debug!(
        anchors = pairs.len(),
        kept = trimmed.len(),
        scale = refit.scale,
        offset = refit.offset,
        "height correction fitted"
    );
    Some(refit)
}

fn least_squares(pairs: &[(f64, f64)]) -> Option<LinearCorrection> {
    let n = pairs.len() as f64;
    let mean_h = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for &(h, y) in pairs {
        sxy += (h - mean_h) * (y - mean_y);
        sxx += (h - mean_h) * (h - mean_h);
    }
    if sxx < 1e-12 {
        return None;
    }
    let scale = sxy / sxx;
    Some(LinearCorrection {
        scale,
        offset: mean_y - scale * mean_h,
    })
}
