//! Lighting module for scene illumination.

mod ambient;
mod directional;

pub use ambient::AmbientLight;
pub use directional::DirectionalLight;

use crate::math::Vec3;
use bytemuck::{Pod, Zeroable};

/// A light attached to a scene node.
#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    /// Uniform fill light.
    Ambient(AmbientLight),
    /// Parallel rays from a direction.
    Directional(DirectionalLight),
}

/// Convert a `0xRRGGBB` sRGB color to linear RGB.
pub fn color_from_hex(hex: u32) -> Vec3 {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    Vec3::new(channel(16), channel(8), channel(0))
}

/// Accumulated lighting for the mesh shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightingUniform {
    /// Ambient color premultiplied by intensity (w unused).
    pub ambient: [f32; 4],
    /// Direction the directional light travels (w unused).
    pub direction: [f32; 4],
    /// Directional color premultiplied by intensity (w unused).
    pub directional: [f32; 4],
    /// x: environment strength (0 when no environment map is bound).
    pub environment: [f32; 4],
}

impl Default for LightingUniform {
    fn default() -> Self {
        Self {
            ambient: [0.0; 4],
            direction: [0.0, -1.0, 0.0, 0.0],
            directional: [0.0; 4],
            environment: [0.0; 4],
        }
    }
}

impl LightingUniform {
    /// Sum a set of lights. Ambient lights add up; the first directional
    /// light wins, later ones are added to its color along its direction.
    pub fn from_lights<'a>(lights: impl IntoIterator<Item = &'a Light>) -> Self {
        let mut uniform = Self::default();
        let mut ambient = Vec3::ZERO;
        let mut directional = Vec3::ZERO;
        let mut direction: Option<Vec3> = None;

        for light in lights {
            match light {
                Light::Ambient(l) => ambient += l.effective_color(),
                Light::Directional(l) => {
                    directional += l.effective_color();
                    direction.get_or_insert(l.direction());
                }
            }
        }

        uniform.ambient = ambient.extend(0.0).to_array();
        uniform.directional = directional.extend(0.0).to_array();
        if let Some(direction) = direction {
            uniform.direction = direction.extend(0.0).to_array();
        }
        uniform
    }

    /// Set how strongly the environment map contributes to diffuse lighting.
    pub fn with_environment(mut self, strength: f32) -> Self {
        self.environment[0] = strength;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_white_and_black() {
        assert!(color_from_hex(0xffffff).abs_diff_eq(Vec3::ONE, 1e-6));
        assert_eq!(color_from_hex(0x000000), Vec3::ZERO);
    }

    #[test]
    fn test_uniform_accumulates() {
        let lights = [
            Light::Ambient(AmbientLight::new(Vec3::ONE, 0.6)),
            Light::Directional(DirectionalLight::from_position(Vec3::ONE, 0.8, Vec3::new(0.0, 10.0, 0.0))),
        ];
        let uniform = LightingUniform::from_lights(&lights);
        assert!((uniform.ambient[0] - 0.6).abs() < 1e-6);
        assert!((uniform.directional[1] - 0.8).abs() < 1e-6);
        assert!((uniform.direction[1] + 1.0).abs() < 1e-6);
    }
}
