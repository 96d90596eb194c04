//! Formation point layouts. Pure geometry, no terrain.
//!
//! Offsets are built in a local frame (forward = +z, right = +x) and
//! rotated so forward points along `heading`.

use std::f64::consts::PI;

use glam::DVec2;

use overwatch_core::enums::FormationType;
use overwatch_core::error::{require_positive, Result, TerrainError};

/// Horizontal offsets for `count` units, rotated to `heading` (degrees).
///
/// * `Line`: abreast, centered on the origin.
/// * `Column`: file behind the lead at the origin.
/// * `Wedge`: lead at the origin, then alternating left and right, one rank
///   back per pair.
/// * `Circle`: evenly spaced, `spacing` apart along the chord, first unit ahead.
/// * `Box`: a centered square grid; `count` must be a perfect square.
pub fn formation_offsets(kind: FormationType, count: usize, spacing: f64, heading: f64) -> Result<Vec<DVec2>> {
    require_positive("spacing", spacing)?;
    let local: Vec<DVec2> = match kind {
        FormationType::Line => {
            let half = (count as f64 - 1.0) / 2.0;
            (0..count)
                .map(|i| DVec2::new((i as f64 - half) * spacing, 0.0))
                .collect()
        }
        FormationType::Column => (0..count)
            .map(|i| DVec2::new(0.0, -(i as f64) * spacing))
            .collect(),
        FormationType::Wedge => (0..count)
            .map(|i| {
                let rank = ((i + 1) / 2) as f64;
                let side = if i % 2 == 1 { -1.0 } else { 1.0 };
                DVec2::new(side * rank * spacing, -rank * spacing)
            })
            .collect(),
        FormationType::Circle => match count {
            0 => Vec::new(),
            1 => vec![DVec2::ZERO],
            n => {
                let radius = spacing / (2.0 * (PI / n as f64).sin());
                (0..n)
                    .map(|i| {
                        let a = 2.0 * PI * i as f64 / n as f64;
                        DVec2::new(a.sin(), a.cos()) * radius
                    })
                    .collect()
            }
        },
        FormationType::Box => {
            let side = (count as f64).sqrt().round() as usize;
            if side * side != count {
                return Err(TerrainError::NonSquareBoxFormation { count });
            }
            let half = (side as f64 - 1.0) / 2.0;
            (0..count)
                .map(|i| {
                    let (row, col) = (i / side, i % side);
                    DVec2::new((col as f64 - half) * spacing, (half - row as f64) * spacing)
                })
                .collect()
        }
    };
    Ok(local.into_iter().map(|p| rotate_to_heading(p, heading)).collect())
}

/// World points for a formation centered on `center`.
pub fn generate_formation_points(
    center: DVec2,
    kind: FormationType,
    count: usize,
    spacing: f64,
    heading: f64,
) -> Result<Vec<DVec2>> {
    Ok(formation_offsets(kind, count, spacing, heading)?
        .into_iter()
        .map(|o| center + o)
        .collect())
}

/// Rotate a local offset clockwise by a navigation heading.
fn rotate_to_heading(p: DVec2, heading: f64) -> DVec2 {
    let (s, c) = heading.to_radians().sin_cos();
    DVec2::new(p.x * c + p.y * s, -p.x * s + p.y * c)
}
