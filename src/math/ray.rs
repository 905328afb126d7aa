//! Ray implementation for picking.

use super::{Box3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// A ray with an origin and direction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Vec3,
    /// Direction of the ray (should be normalized).
    pub direction: Vec3,
}

/// Result of a ray/triangle test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Distance along the ray.
    pub distance: f32,
    /// Barycentric u.
    pub u: f32,
    /// Barycentric v.
    pub v: f32,
}

impl Ray {
    /// Create a new ray.
    #[inline]
    pub const fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Get a point at distance t along the ray.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Intersect with an axis-aligned bounding box.
    /// Returns (tmin, tmax) if intersection, None otherwise.
    pub fn intersect_box(&self, box3: &Box3) -> Option<(f32, f32)> {
        if box3.is_empty() {
            return None;
        }
        let inv_dir = self.direction.recip();

        let t1 = (box3.min - self.origin) * inv_dir;
        let t2 = (box3.max - self.origin) * inv_dir;

        let tmin = t1.min(t2).max_element();
        let tmax = t1.max(t2).min_element();

        if tmax < 0.0 || tmin > tmax {
            None
        } else {
            Some((tmin.max(0.0), tmax))
        }
    }

    /// Intersect with a triangle (Möller–Trumbore), both faces.
    pub fn intersect_triangle(&self, a: Vec3, b: Vec3, c: Vec3) -> Option<TriangleHit> {
        let edge1 = b - a;
        let edge2 = c - a;
        let h = self.direction.cross(edge2);
        let det = edge1.dot(h);

        if det.abs() < 1e-8 {
            return None;
        }

        let f = 1.0 / det;
        let s = self.origin - a;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * self.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let distance = f * edge2.dot(q);
        (distance > 1e-8).then_some(TriangleHit { distance, u, v })
    }

    /// Apply a matrix to this ray. The direction is renormalized, so
    /// distances measured on the result are in the target space.
    pub fn apply_matrix4(&self, m: &Mat4) -> Self {
        Self {
            origin: m.transform_point3(self.origin),
            direction: m.transform_vector3(self.direction).normalize_or_zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(ray.at(5.0).abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-6));
    }

    #[test]
    fn test_box_hit_and_miss() {
        let b = Box3::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let hit = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z).intersect_box(&b);
        let (tmin, tmax) = hit.expect("ray should hit the box");
        assert!((tmin - 4.0).abs() < 1e-5);
        assert!((tmax - 6.0).abs() < 1e-5);

        let miss = Ray::new(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z).intersect_box(&b);
        assert!(miss.is_none());
    }

    #[test]
    fn test_triangle_hit_from_both_sides() {
        let (a, b, c) = (Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        let front = Ray::new(Vec3::new(0.0, 0.0, 2.0), Vec3::NEG_Z).intersect_triangle(a, b, c);
        let back = Ray::new(Vec3::new(0.0, 0.0, -2.0), Vec3::Z).intersect_triangle(a, b, c);
        assert!((front.unwrap().distance - 2.0).abs() < 1e-5);
        assert!((back.unwrap().distance - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_triangle_behind_origin() {
        let (a, b, c) = (Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 2.0), Vec3::Z);
        assert!(ray.intersect_triangle(a, b, c).is_none());
    }
}
