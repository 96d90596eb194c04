//! Error types for terrain analysis.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerrainError {
    #[error("Invalid raster: {reason}")]
    InvalidRaster { reason: String },

    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Invalid distance range: min {min} exceeds max {max}")]
    InvalidDistanceRange { min: f64, max: f64 },

    #[error("Box formation needs a perfect square unit count, got {count}")]
    NonSquareBoxFormation { count: usize },

    #[error("Invalid scorer weights: {reason}")]
    InvalidWeights { reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TerrainError>;

impl TerrainError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Reject values that are not strictly positive and finite.
pub fn require_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TerrainError::invalid(name, format!("must be > 0, got {value}")))
    }
}

/// Reject zero counts.
pub fn require_nonzero(name: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        Err(TerrainError::invalid(name, "must be at least 1"))
    } else {
        Ok(())
    }
}
