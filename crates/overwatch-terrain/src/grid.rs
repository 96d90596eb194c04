//! HeightField: loaded heightmap with elevation queries.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use overwatch_core::constants::CITY_DENSITY_THRESHOLD;
use overwatch_core::enums::OrientationMode;
use overwatch_core::error::{Result, TerrainError};

use crate::footprint::BaseFootprint;
use crate::orientation;

/// Per-map linear correction applied to raster samples: `h * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearCorrection {
    pub scale: f64,
    pub offset: f64,
}

impl Default for LinearCorrection {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
        }
    }
}

impl LinearCorrection {
    pub fn apply(&self, h: f64) -> f64 {
        h * self.scale + self.offset
    }
}

/// Raster header metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterHeader {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Meters per grid cell.
    pub cell_size: f64,
    pub orientation: OrientationMode,
    /// Elevation mapped from a normalized value of 0.
    pub min_height: f64,
    /// Elevation mapped from a normalized value of 1.
    pub max_height: f64,
    #[serde(default)]
    pub correction: LinearCorrection,
    /// Natural terrain never reports below this altitude.
    #[serde(default)]
    pub sea_level_floor: Option<f64>,
}

impl RasterHeader {
    /// Header for a raster in the default orientation with no correction.
    pub fn new(width: usize, height: usize, cell_size: f64, min_height: f64, max_height: f64) -> Self {
        Self {
            width,
            height,
            cell_size,
            orientation: OrientationMode::Identity,
            min_height,
            max_height,
            correction: LinearCorrection::default(),
            sea_level_floor: None,
        }
    }

    /// World extent (meters) as (x, z) under the header's orientation.
    pub fn extent(&self) -> DVec2 {
        self.extent_with(self.orientation)
    }

    /// World extent (meters) as (x, z) under a given orientation.
    /// Transposed modes lay raster rows along x.
    pub fn extent_with(&self, mode: OrientationMode) -> DVec2 {
        let cols = self.cell_size * (self.width - 1) as f64;
        let rows = self.cell_size * (self.height - 1) as f64;
        if orientation::is_transposed(mode) {
            DVec2::new(rows, cols)
        } else {
            DVec2::new(cols, rows)
        }
    }
}

/// Immutable elevation raster plus base overlays.
#[derive(Debug, Clone)]
pub struct HeightField {
    pub header: RasterHeader,
    /// Elevation values in meters, row-major.
    elevations: Vec<f32>,
    footprints: Vec<BaseFootprint>,
    /// Optional city density in [0, 1], row-major, same shape as the elevations.
    city_density: Option<Vec<f32>>,
}

impl HeightField {
    /// Create a HeightField from elevations in meters.
    pub fn new(header: RasterHeader, elevations: Vec<f32>, footprints: Vec<BaseFootprint>) -> Result<Self> {
        if header.width < 2 || header.height < 2 {
            return Err(TerrainError::InvalidRaster {
                reason: format!("raster must be at least 2x2, got {}x{}", header.width, header.height),
            });
        }
        if !(header.cell_size.is_finite() && header.cell_size > 0.0) {
            return Err(TerrainError::InvalidRaster {
                reason: format!("cell size must be positive, got {}", header.cell_size),
            });
        }
        if elevations.len() != header.width * header.height {
            return Err(TerrainError::InvalidRaster {
                reason: format!(
                    "expected {} samples for {}x{}, got {}",
                    header.width * header.height,
                    header.width,
                    header.height,
                    elevations.len()
                ),
            });
        }
        Ok(Self {
            header,
            elevations,
            footprints,
            city_density: None,
        })
    }

    /// Create from normalized 0..1 samples scaled into the header's height range.
    pub fn from_normalized(header: RasterHeader, values: &[f32], footprints: Vec<BaseFootprint>) -> Result<Self> {
        let range = header.max_height - header.min_height;
        let elevations = values
            .iter()
            .map(|v| (*v as f64 * range + header.min_height) as f32)
            .collect();
        Self::new(header, elevations, footprints)
    }

    /// Attach a city density layer sampled on the elevation grid.
    pub fn with_city_density(mut self, density: Vec<f32>) -> Result<Self> {
        let expected = self.header.width * self.header.height;
        if density.len() != expected {
            return Err(TerrainError::InvalidRaster {
                reason: format!("expected {expected} city density samples, got {}", density.len()),
            });
        }
        if let Some(bad) = density.iter().find(|d| !(0.0..=1.0).contains(*d)) {
            return Err(TerrainError::InvalidRaster {
                reason: format!("city density must be within [0, 1], got {bad}"),
            });
        }
        self.city_density = Some(density);
        Ok(self)
    }

    /// Same raster with a different orientation mode.
    pub fn with_orientation(mut self, mode: OrientationMode) -> Self {
        self.header.orientation = mode;
        self
    }

    /// Same raster with a different linear correction.
    pub fn with_correction(mut self, correction: LinearCorrection) -> Self {
        self.header.correction = correction;
        self
    }

    pub fn extent(&self) -> DVec2 {
        self.header.extent()
    }

    pub fn cell_size(&self) -> f64 {
        self.header.cell_size
    }

    pub fn min_height(&self) -> f64 {
        self.header.min_height
    }

    pub fn footprints(&self) -> &[BaseFootprint] {
        &self.footprints
    }

    pub fn contains(&self, x: f64, z: f64) -> bool {
        self.normalize_with(self.header.orientation, x, z).is_some()
    }

    /// Normalized (u, v), or None outside the raster.
    fn normalize_with(&self, mode: OrientationMode, x: f64, z: f64) -> Option<(f64, f64)> {
        let extent = self.header.extent_with(mode);
        let u = x / extent.x;
        let v = z / extent.y;
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return None;
        }
        Some((u, v))
    }

    /// Uncorrected bilinear elevation under a given orientation mode.
    pub(crate) fn raw_height_with(&self, mode: OrientationMode, x: f64, z: f64) -> Option<f64> {
        let (u, v) = self.normalize_with(mode, x, z)?;
        let (cu, rv) = orientation::to_raster(mode, u, v);
        let col = cu * (self.header.width - 1) as f64;
        let row = rv * (self.header.height - 1) as f64;
        Some(self.bilinear(row, col))
    }

    /// Raster elevation with correction and floor, ignoring footprints.
    pub fn raster_height(&self, x: f64, z: f64) -> Option<f64> {
        let raw = self.raw_height_with(self.header.orientation, x, z)?;
        let h = self.header.correction.apply(raw);
        Some(match self.header.sea_level_floor {
            Some(floor) => h.max(floor),
            None => h,
        })
    }

    /// Elevation at a world point. Footprints override the raster.
    /// Returns None if the point is outside the raster.
    pub fn height_at(&self, x: f64, z: f64) -> Option<f64> {
        if !self.contains(x, z) {
            return None;
        }
        if let Some(fp) = self.footprint_at(x, z) {
            return Some(fp.flatten_height);
        }
        self.raster_height(x, z)
    }

    /// Elevation at a world point, or `default` outside the raster.
    pub fn sample_height(&self, x: f64, z: f64, default: f64) -> f64 {
        self.height_at(x, z).unwrap_or(default)
    }

    /// Elementwise [`Self::sample_height`].
    pub fn batch_sample(&self, points: &[DVec2], default: f64) -> Vec<f64> {
        points
            .iter()
            .map(|p| self.sample_height(p.x, p.y, default))
            .collect()
    }

    /// First footprint (in table order) containing the point.
    pub fn footprint_at(&self, x: f64, z: f64) -> Option<&BaseFootprint> {
        let p = DVec2::new(x, z);
        self.footprints.iter().find(|fp| fp.contains(p))
    }

    /// Unit surface normal by forward differences with step `delta`.
    pub fn normal_at(&self, x: f64, z: f64, delta: f64) -> DVec3 {
        let h0 = self.sample_height(x, z, self.header.min_height);
        let hx = self.sample_height(x + delta, z, h0);
        let hz = self.sample_height(x, z + delta, h0);
        let vx = DVec3::new(delta, hx - h0, 0.0);
        let vz = DVec3::new(0.0, hz - h0, delta);
        vz.cross(vx).try_normalize().unwrap_or(DVec3::Y)
    }

    /// Slope angle in degrees from the local normal.
    pub fn slope_deg_at(&self, x: f64, z: f64, delta: f64) -> f64 {
        let n = self.normal_at(x, z, delta);
        n.y.clamp(-1.0, 1.0).acos().to_degrees()
    }

    pub fn base_by_id(&self, id: u32) -> Option<&BaseFootprint> {
        self.footprints.iter().find(|fp| fp.id == id)
    }

    /// Case-insensitive substring match on the base name.
    pub fn base_by_name(&self, name: &str) -> Option<&BaseFootprint> {
        let needle = name.to_lowercase();
        self.footprints
            .iter()
            .find(|fp| fp.name.to_lowercase().contains(&needle))
    }

    /// Base whose centroid is closest to the point, with its distance.
    pub fn nearest_base(&self, x: f64, z: f64) -> Option<(&BaseFootprint, f64)> {
        let p = DVec2::new(x, z);
        self.footprints
            .iter()
            .map(|fp| (fp, fp.centroid().distance(p)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// City density at a world point, 0 outside any city.
    ///
    /// The density of the cell's lower corner counts only when all four
    /// corners of the cell exceed [`CITY_DENSITY_THRESHOLD`]. Points off the
    /// raster, on its last row or column, or without a density layer give 0.
    pub fn city_density_at(&self, x: f64, z: f64) -> f64 {
        let Some(density) = &self.city_density else {
            return 0.0;
        };
        let Some((u, v)) = self.normalize_with(self.header.orientation, x, z) else {
            return 0.0;
        };
        let (cu, rv) = orientation::to_raster(self.header.orientation, u, v);
        let (w, h) = (self.header.width, self.header.height);
        let col = (cu * (w - 1) as f64).floor() as usize;
        let row = (rv * (h - 1) as f64).floor() as usize;
        if col >= w - 1 || row >= h - 1 {
            return 0.0;
        }
        let at = |r: usize, c: usize| density[r * w + c] as f64;
        let corners = [at(row, col), at(row, col + 1), at(row + 1, col + 1), at(row + 1, col)];
        if corners.iter().all(|d| *d > CITY_DENSITY_THRESHOLD) {
            corners[0]
        } else {
            0.0
        }
    }

    pub fn has_city_layer(&self) -> bool {
        self.city_density.is_some()
    }

    fn raw_elevation(&self, row: usize, col: usize) -> f64 {
        self.elevations[row * self.header.width + col] as f64
    }

    /// Bilinear interpolation at fractional row/col.
    fn bilinear(&self, row: f64, col: f64) -> f64 {
        let max_r = self.header.height - 1;
        let max_c = self.header.width - 1;
        let r0 = (row.floor() as usize).min(max_r);
        let c0 = (col.floor() as usize).min(max_c);
        let r1 = (r0 + 1).min(max_r);
        let c1 = (c0 + 1).min(max_c);

        let fr = row - r0 as f64;
        let fc = col - c0 as f64;

        let e00 = self.raw_elevation(r0, c0);
        let e01 = self.raw_elevation(r0, c1);
        let e10 = self.raw_elevation(r1, c0);
        let e11 = self.raw_elevation(r1, c1);

        let top = e00 * (1.0 - fc) + e01 * fc;
        let bot = e10 * (1.0 - fc) + e11 * fc;
        top * (1.0 - fr) + bot * fr
    }
}
