//! Directional light (sun-like parallel rays).

use crate::math::Vec3;

/// Directional light emitting parallel rays.
///
/// Like a three.js directional light, it is placed at a position and
/// shines toward the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Light color (linear RGB).
    pub color: Vec3,
    /// Light intensity.
    pub intensity: f32,
    /// Light direction (normalized, pointing from the light into the scene).
    direction: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::from_position(Vec3::ONE, 0.8, Vec3::new(5.0, 10.0, 7.0))
    }
}

impl DirectionalLight {
    /// Create a light shining along `direction`.
    pub fn new(color: Vec3, intensity: f32, direction: Vec3) -> Self {
        Self {
            color,
            intensity,
            direction: direction.try_normalize().unwrap_or(Vec3::NEG_Y),
        }
    }

    /// Create a light at `position` aimed at the origin.
    pub fn from_position(color: Vec3, intensity: f32, position: Vec3) -> Self {
        Self::new(color, intensity, -position)
    }

    /// Get the light direction.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Get the effective color (color * intensity).
    pub fn effective_color(&self) -> Vec3 {
        self.color * self.intensity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_position_points_at_origin() {
        let light = DirectionalLight::from_position(Vec3::ONE, 1.0, Vec3::new(0.0, 5.0, 0.0));
        assert!(light.direction().abs_diff_eq(Vec3::NEG_Y, 1e-6));
    }

    #[test]
    fn test_degenerate_direction() {
        let light = DirectionalLight::new(Vec3::ONE, 1.0, Vec3::ZERO);
        assert_eq!(light.direction(), Vec3::NEG_Y);
    }
}
