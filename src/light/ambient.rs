//! Ambient light.

use crate::math::Vec3;

/// Ambient light that illuminates all objects equally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    /// Light color (linear RGB).
    pub color: Vec3,
    /// Light intensity.
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self::new(Vec3::ONE, 0.6)
    }
}

impl AmbientLight {
    /// Create a new ambient light.
    pub fn new(color: Vec3, intensity: f32) -> Self {
        Self { color, intensity }
    }

    /// Get the effective color (color * intensity).
    pub fn effective_color(&self) -> Vec3 {
        self.color * self.intensity
    }
}
