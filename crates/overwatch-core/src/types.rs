//! Fundamental geometric types.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::enums::WaypointKind;

/// 3D position in world space (meters).
/// x = East, y = Up (altitude), z = North.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Orientation in degrees. Yaw is a navigation heading (0 = North, clockwise).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

/// A single point of a generated path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub position: Position,
    pub kind: WaypointKind,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Position on the ground plane with the given altitude.
    pub fn from_horizontal(p: DVec2, altitude: f64) -> Self {
        Self::new(p.x, altitude, p.y)
    }

    /// Horizontal component as (x, z).
    pub fn horizontal(&self) -> DVec2 {
        DVec2::new(self.x, self.z)
    }

    pub fn to_vec3(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    /// Range to another position in meters (3D distance).
    pub fn range_to(&self, other: &Position) -> f64 {
        self.to_vec3().distance(other.to_vec3())
    }

    /// Horizontal range (ignoring altitude).
    pub fn horizontal_range_to(&self, other: &Position) -> f64 {
        self.horizontal().distance(other.horizontal())
    }

    /// Bearing to another position in degrees (0 = North, clockwise).
    pub fn bearing_to(&self, other: &Position) -> f64 {
        bearing_deg(self.horizontal(), other.horizontal())
    }
}

impl Rotation {
    pub fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Yaw-only rotation.
    pub fn from_yaw(yaw: f64) -> Self {
        Self::new(0.0, yaw, 0.0)
    }
}

impl Waypoint {
    pub fn new(position: Position, kind: WaypointKind) -> Self {
        Self { position, kind }
    }
}

/// Navigation bearing from `from` to `to` in degrees, in [0, 360).
/// Horizontal vectors are (x, z), so +z is North and +x is East.
pub fn bearing_deg(from: DVec2, to: DVec2) -> f64 {
    let d = to - from;
    d.x.atan2(d.y).to_degrees().rem_euclid(360.0)
}

/// Unit horizontal direction for a navigation bearing in degrees.
pub fn bearing_dir(bearing: f64) -> DVec2 {
    let r = bearing.to_radians();
    DVec2::new(r.sin(), r.cos())
}

/// Smallest absolute difference between two bearings in degrees, in [0, 180].
pub fn bearing_delta(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}
