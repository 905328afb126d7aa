//! Raycaster utility for screen-to-world ray casting.

use super::{Mat4, Ray, Vec2, Vec3};

/// Utility for creating rays from screen coordinates.
pub struct Raycaster;

impl Raycaster {
    /// Convert client-space pixel coordinates to NDC (-1 to 1, Y up).
    ///
    /// Returns `None` for a degenerate viewport.
    pub fn screen_to_ndc(screen_x: f32, screen_y: f32, width: f32, height: f32) -> Option<Vec2> {
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        Some(Vec2::new(
            (screen_x / width) * 2.0 - 1.0,
            -((screen_y / height) * 2.0 - 1.0),
        ))
    }

    /// Create a ray from normalized device coordinates.
    ///
    /// # Arguments
    /// * `ndc` - Point in NDC (-1 to 1)
    /// * `view_proj_inverse` - Inverse of (projection * view) matrix
    pub fn ray_from_ndc(ndc: Vec2, view_proj_inverse: &Mat4) -> Ray {
        // wgpu clip space: z = 0 is the near plane, z = 1 the far plane
        let near_world = view_proj_inverse.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far_world = view_proj_inverse.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));

        Ray::new(near_world, (far_world - near_world).normalize_or_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_to_ndc_flips_y() {
        let ndc = Raycaster::screen_to_ndc(0.0, 0.0, 800.0, 600.0).unwrap();
        assert_eq!(ndc, Vec2::new(-1.0, 1.0));
        let ndc = Raycaster::screen_to_ndc(800.0, 600.0, 800.0, 600.0).unwrap();
        assert_eq!(ndc, Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_zero_viewport() {
        assert!(Raycaster::screen_to_ndc(10.0, 10.0, 0.0, 600.0).is_none());
    }

    #[test]
    fn test_screen_center_ray() {
        let ndc = Raycaster::screen_to_ndc(400.0, 300.0, 800.0, 600.0).unwrap();
        let ray = Raycaster::ray_from_ndc(ndc, &Mat4::IDENTITY);
        assert!(ray.origin.x.abs() < 0.01);
        assert!(ray.origin.y.abs() < 0.01);
        assert!(ray.direction.abs_diff_eq(Vec3::Z, 1e-6));
    }
}
