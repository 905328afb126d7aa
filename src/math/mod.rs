//! # Math Module
//!
//! Ray casting and small scalar helpers on top of `glam`.

mod box3;
mod ray;
mod raycaster;

pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

pub use box3::Box3;
pub use ray::{Ray, TriangleHit};
pub use raycaster::Raycaster;

/// Small epsilon for floating point comparisons.
pub const EPSILON: f32 = 1e-6;

/// Clamp a value between min and max.
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Linear interpolation between two values.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Hermite smooth step, matching the WGSL builtin.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = clamp((x - edge0) / (edge1 - edge0), 0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(smoothstep(0.6, 1.2, 0.0), 0.0);
        assert_eq!(smoothstep(0.6, 1.2, 2.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(2.0, 4.0, 0.5), 3.0);
    }
}
