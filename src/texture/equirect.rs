//! Equirectangular environment image.

use crate::core::Id;
use crate::math::Vec3;
use std::f32::consts::PI;

/// A decoded equirectangular panorama (RGBA8, sRGB encoded).
///
/// Used both as the scene background and as the lighting environment.
#[derive(Debug, Clone)]
pub struct EquirectImage {
    id: Id,
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl EquirectImage {
    /// Wrap RGBA8 pixel data. Returns `None` if the buffer size does not
    /// match the dimensions.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        (width > 0 && height > 0 && rgba.len() == expected).then(|| Self {
            id: Id::new(),
            width,
            height,
            rgba,
        })
    }

    /// Unique ID, used to upload each image once.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 pixels, row-major from the top.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.rgba
    }

    /// Map a world direction to equirectangular UV. Must stay in sync with
    /// `dir_to_equirect_uv` in the WGSL shaders.
    pub fn direction_to_uv(direction: Vec3) -> (f32, f32) {
        let d = direction.normalize_or_zero();
        let u = d.z.atan2(d.x) / (2.0 * PI) + 0.5;
        let v = d.y.clamp(-1.0, 1.0).acos() / PI;
        (u, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_mismatch_rejected() {
        assert!(EquirectImage::new(2, 2, vec![0; 15]).is_none());
        assert!(EquirectImage::new(0, 2, Vec::new()).is_none());
        assert!(EquirectImage::new(2, 2, vec![0; 16]).is_some());
    }

    #[test]
    fn test_poles_map_to_top_and_bottom() {
        let (_, v_up) = EquirectImage::direction_to_uv(Vec3::Y);
        let (_, v_down) = EquirectImage::direction_to_uv(Vec3::NEG_Y);
        assert!(v_up.abs() < 1e-6);
        assert!((v_down - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_horizon_is_vertical_center() {
        let (u, v) = EquirectImage::direction_to_uv(Vec3::X);
        assert!((u - 0.5).abs() < 1e-6);
        assert!((v - 0.5).abs() < 1e-6);
    }
}
