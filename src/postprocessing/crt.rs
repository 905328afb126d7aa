//! CRT screen model: parameters, uniform block, and the per-pixel function.
//!
//! [`CrtShader::shade`] is the reference for the WGSL in
//! [`CrtPass`](super::CrtPass); both must stay in step.

use crate::math::{smoothstep, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Corner radius of the screen mask, in UV units.
pub const CORNER_RADIUS: f32 = 0.05;

/// Tunable CRT look. Constant for the lifetime of the filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrtSettings {
    /// Barrel distortion strength.
    pub distortion: f32,
    /// Screen curvature. Uploaded but not read by the shader.
    pub curvature: f32,
    /// Scanline frequency across the screen height.
    pub scanline_density: f32,
    /// Scanline darkening amplitude.
    pub scanline_intensity: f32,
    /// Vignette strength.
    pub vignetting: f32,
    /// Chromatic aberration strength near the edges.
    pub chroma_aberration: f32,
    /// Radial edge warp strength.
    pub edge_warp: f32,
}

impl Default for CrtSettings {
    fn default() -> Self {
        Self {
            distortion: 0.1,
            curvature: 0.1,
            scanline_density: 800.0,
            scanline_intensity: 0.1,
            vignetting: 0.9,
            chroma_aberration: 0.0015,
            edge_warp: 0.12,
        }
    }
}

/// Uniform block shared with the CRT shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CrtUniform {
    /// Output size in pixels.
    pub resolution: [f32; 2],
    /// Seconds of filter time.
    pub time: f32,
    /// See [`CrtSettings::distortion`].
    pub distortion: f32,
    /// See [`CrtSettings::curvature`].
    pub curvature: f32,
    /// See [`CrtSettings::scanline_density`].
    pub scanline_density: f32,
    /// See [`CrtSettings::scanline_intensity`].
    pub scanline_intensity: f32,
    /// See [`CrtSettings::vignetting`].
    pub vignetting: f32,
    /// See [`CrtSettings::chroma_aberration`].
    pub chroma_aberration: f32,
    /// See [`CrtSettings::edge_warp`].
    pub edge_warp: f32,
    /// Padding to 16 bytes.
    pub _pad: [f32; 2],
}

/// Live parameter set: fixed settings plus resolution and time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrtParameters {
    settings: CrtSettings,
    width: u32,
    height: u32,
    time: f32,
}

impl CrtParameters {
    /// Create parameters for a `width`×`height` output. Zero sizes become 1.
    pub fn new(settings: CrtSettings, width: u32, height: u32) -> Self {
        Self {
            settings,
            width: width.max(1),
            height: height.max(1),
            time: 0.0,
        }
    }

    /// Update the resolution. Returns `false` and keeps the previous size
    /// when either dimension is zero.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    /// Set the time uniform.
    pub fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    /// Settings.
    #[inline]
    pub fn settings(&self) -> &CrtSettings {
        &self.settings
    }

    /// Current size in pixels.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Current time.
    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Pack for upload.
    pub fn uniform(&self) -> CrtUniform {
        let s = &self.settings;
        CrtUniform {
            resolution: [self.width as f32, self.height as f32],
            time: self.time,
            distortion: s.distortion,
            curvature: s.curvature,
            scanline_density: s.scanline_density,
            scanline_intensity: s.scanline_intensity,
            vignetting: s.vignetting,
            chroma_aberration: s.chroma_aberration,
            edge_warp: s.edge_warp,
            _pad: [0.0; 2],
        }
    }
}

/// CPU evaluation of the CRT fragment shader.
pub struct CrtShader;

impl CrtShader {
    /// Shade the output pixel at `uv` (origin top left), reading the
    /// offscreen image through `sample`.
    ///
    /// Scanlines are phased on the row measured from the bottom edge, so
    /// they line up with a bottom-left UV convention.
    pub fn shade(uniform: &CrtUniform, uv: Vec2, sample: impl Fn(Vec2) -> Vec3) -> Vec4 {
        let centered = uv - 0.5;
        let d = centered.length();
        let warped = 0.5 + centered * (1.0 + uniform.edge_warp * d * d);
        if warped.cmplt(Vec2::ZERO).any() || warped.cmpgt(Vec2::ONE).any() {
            return Vec4::new(0.0, 0.0, 0.0, 1.0);
        }

        let offset = warped - 0.5;
        let uv = warped + offset * uniform.distortion * offset.length_squared();
        let from_center = uv - 0.5;
        let radius = from_center.length();

        let mut color = sample(uv);

        let edge = radius * 5.0;
        if edge > 0.3 {
            let shift = uniform.chroma_aberration * edge * edge * 2.0;
            color = Vec3::new(
                sample(uv + Vec2::new(shift, 0.0)).x,
                sample(uv + Vec2::new(shift * 0.5, 0.0)).y,
                sample(uv - Vec2::new(shift, 0.0)).z,
            );
        }

        let row = 1.0 - uv.y;
        let scan = (row * uniform.scanline_density + uniform.time * 3.0).sin() * uniform.scanline_intensity;
        color *= 1.0 - 0.5 * scan;

        color *= (1.0 - radius * radius * uniform.vignetting).max(0.0);

        color *= 1.0 - smoothstep(-0.01, 0.01, rounded_rect_distance(from_center));

        color *= 1.0 - 0.4 * smoothstep(0.6, 1.2, radius * 2.0);

        color.extend(1.0)
    }
}

/// Signed distance from a centered point to the unit screen rectangle
/// with rounded corners. Negative inside.
fn rounded_rect_distance(p: Vec2) -> f32 {
    let q = p.abs() - Vec2::splat(0.5 - CORNER_RADIUS);
    q.max(Vec2::ZERO).length() + q.x.max(q.y).min(0.0) - CORNER_RADIUS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform() -> CrtUniform {
        CrtParameters::new(CrtSettings::default(), 800, 600).uniform()
    }

    fn white(_: Vec2) -> Vec3 {
        Vec3::ONE
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<CrtUniform>(), 48);
    }

    #[test]
    fn test_outside_warp_is_opaque_black() {
        let u = uniform();
        for uv in [Vec2::ZERO, Vec2::ONE, Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 0.5)] {
            assert_eq!(CrtShader::shade(&u, uv, white), Vec4::new(0.0, 0.0, 0.0, 1.0), "uv {uv}");
        }
    }

    #[test]
    fn test_strong_warp_blackens_more() {
        let mut settings = CrtSettings::default();
        settings.edge_warp = 10.0;
        let u = CrtParameters::new(settings, 100, 100).uniform();
        let shaded = CrtShader::shade(&u, Vec2::new(0.2, 0.5), white);
        assert_eq!(shaded, Vec4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_alpha_always_one() {
        let u = uniform();
        for y in 0..=20 {
            for x in 0..=20 {
                let uv = Vec2::new(x as f32 / 20.0, y as f32 / 20.0);
                assert_eq!(CrtShader::shade(&u, uv, white).w, 1.0);
            }
        }
    }

    #[test]
    fn test_center_pixel_only_scanlines() {
        let u = uniform();
        let shaded = CrtShader::shade(&u, Vec2::splat(0.5), white);
        let expected = 1.0 - 0.5 * (0.5 * u.scanline_density).sin() * u.scanline_intensity;
        assert!((shaded.x - expected).abs() < 1e-5);
        assert!((shaded.y - expected).abs() < 1e-5);
    }

    #[test]
    fn test_scanline_row_counts_from_bottom() {
        let settings = CrtSettings {
            distortion: 0.0,
            edge_warp: 0.0,
            vignetting: 0.0,
            chroma_aberration: 0.0,
            scanline_density: 10.0,
            scanline_intensity: 1.0,
            ..Default::default()
        };
        let u = CrtParameters::new(settings, 100, 100).uniform();

        let top = CrtShader::shade(&u, Vec2::new(0.5, 0.25), white);
        assert!((top.x - (1.0 - 0.5 * 7.5f32.sin())).abs() < 1e-5);

        let bottom = CrtShader::shade(&u, Vec2::new(0.5, 0.75), white);
        assert!((bottom.x - (1.0 - 0.5 * 2.5f32.sin())).abs() < 1e-5);
    }

    #[test]
    fn test_chroma_offsets_near_edge() {
        let mut settings = CrtSettings::default();
        settings.chroma_aberration = 0.01;
        settings.scanline_intensity = 0.0;
        settings.vignetting = 0.0;
        let u = CrtParameters::new(settings, 100, 100).uniform();

        // Colour encodes the sampled x coordinate in every channel.
        let shaded = CrtShader::shade(&u, Vec2::new(0.3, 0.5), |uv| Vec3::splat(uv.x));
        assert!(shaded.x > shaded.y);
        assert!(shaded.y > shaded.z);
    }

    #[test]
    fn test_no_chroma_near_center() {
        let mut settings = CrtSettings::default();
        settings.chroma_aberration = 0.5;
        let u = CrtParameters::new(settings, 100, 100).uniform();
        let shaded = CrtShader::shade(&u, Vec2::new(0.52, 0.5), |uv| Vec3::splat(uv.x));
        assert_eq!(shaded.x, shaded.z);
    }

    #[test]
    fn test_time_moves_scanlines() {
        let mut params = CrtParameters::new(CrtSettings::default(), 100, 100);
        let before = CrtShader::shade(&params.uniform(), Vec2::new(0.5, 0.4), white);
        params.set_time(0.5);
        let after = CrtShader::shade(&params.uniform(), Vec2::new(0.5, 0.4), white);
        assert_ne!(before, after);
    }

    #[test]
    fn test_resize_sets_resolution() {
        let mut params = CrtParameters::new(CrtSettings::default(), 800, 600);
        assert!(params.resize(1024, 768));
        assert_eq!(params.size(), (1024, 768));
        assert_eq!(params.uniform().resolution, [1024.0, 768.0]);

        assert!(!params.resize(0, 768));
        assert!(!params.resize(1024, 0));
        assert_eq!(params.size(), (1024, 768));
    }

    #[test]
    fn test_rounded_rect_distance() {
        assert!(rounded_rect_distance(Vec2::ZERO) < 0.0);
        assert!(rounded_rect_distance(Vec2::splat(0.5)) > 0.0);
        assert!((rounded_rect_distance(Vec2::new(0.5, 0.0))).abs() < 1e-6);
    }
}
