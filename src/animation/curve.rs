//! Centripetal Catmull-Rom curve through 3D control points.

use crate::math::Vec3;

/// Segment lengths below this are treated as degenerate.
const MIN_SEGMENT: f32 = 1e-4;

/// Cubic polynomial for one coordinate of one segment.
#[derive(Debug, Clone, Copy)]
struct Cubic {
    c0: f32,
    c1: f32,
    c2: f32,
    c3: f32,
}

impl Cubic {
    /// Hermite form from endpoints and tangents.
    fn hermite(x0: f32, x1: f32, t0: f32, t1: f32) -> Self {
        Self {
            c0: x0,
            c1: t0,
            c2: -3.0 * x0 + 3.0 * x1 - 2.0 * t0 - t1,
            c3: 2.0 * x0 - 2.0 * x1 + t0 + t1,
        }
    }

    /// Non-uniform Catmull-Rom with knot intervals `dt0..dt2`.
    fn nonuniform(x: [f32; 4], dt0: f32, dt1: f32, dt2: f32) -> Self {
        let [x0, x1, x2, x3] = x;
        let t1 = (x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1;
        let t2 = (x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2;
        Self::hermite(x1, x2, t1 * dt1, t2 * dt1)
    }

    fn eval(&self, t: f32) -> f32 {
        ((self.c3 * t + self.c2) * t + self.c1) * t + self.c0
    }
}

/// Smooth open curve passing through every control point, parameterised
/// uniformly per segment over `t ∈ [0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CatmullRomCurve3 {
    points: Vec<Vec3>,
}

impl CatmullRomCurve3 {
    /// Build a curve; needs at least two points.
    pub fn new(points: impl Into<Vec<Vec3>>) -> Option<Self> {
        let points = points.into();
        (points.len() >= 2).then_some(Self { points })
    }

    /// Curve through exactly three points.
    pub fn through(points: [Vec3; 3]) -> Self {
        Self {
            points: points.to_vec(),
        }
    }

    /// Control points.
    #[inline]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// First control point.
    #[inline]
    pub fn start(&self) -> Vec3 {
        self.points[0]
    }

    /// Last control point.
    #[inline]
    pub fn end(&self) -> Vec3 {
        self.points[self.points.len() - 1]
    }

    /// Point at parameter `t`, clamped to `[0, 1]`.
    pub fn point_at(&self, t: f32) -> Vec3 {
        let points = &self.points;
        let len = points.len();
        let p = (len - 1) as f32 * t.clamp(0.0, 1.0);

        let mut segment = p.floor() as usize;
        let mut weight = p - segment as f32;
        if segment >= len - 1 {
            segment = len - 2;
            weight = 1.0;
        }

        let p1 = points[segment];
        let p2 = points[segment + 1];
        // Ends are extended by reflecting the neighbouring point.
        let p0 = if segment > 0 { points[segment - 1] } else { 2.0 * p1 - p2 };
        let p3 = if segment + 2 < len { points[segment + 2] } else { 2.0 * p2 - p1 };

        let mut dt0 = p0.distance_squared(p1).powf(0.25);
        let mut dt1 = p1.distance_squared(p2).powf(0.25);
        let mut dt2 = p2.distance_squared(p3).powf(0.25);
        if dt1 < MIN_SEGMENT {
            dt1 = 1.0;
        }
        if dt0 < MIN_SEGMENT {
            dt0 = dt1;
        }
        if dt2 < MIN_SEGMENT {
            dt2 = dt1;
        }

        let axis = |a: usize| Cubic::nonuniform([p0[a], p1[a], p2[a], p3[a]], dt0, dt1, dt2).eval(weight);
        Vec3::new(axis(0), axis(1), axis(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> CatmullRomCurve3 {
        CatmullRomCurve3::new(vec![
            Vec3::new(-200.0, 50.0, 0.0),
            Vec3::new(-100.0, 30.0, 60.0),
            Vec3::new(-20.0, 10.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_passes_through_control_points() {
        let c = curve();
        assert!(c.point_at(0.0).abs_diff_eq(c.points()[0], 1e-3));
        assert!(c.point_at(0.5).abs_diff_eq(c.points()[1], 1e-3));
        assert!(c.point_at(1.0).abs_diff_eq(c.end(), 1e-3));
    }

    #[test]
    fn test_parameter_clamped() {
        let c = curve();
        assert_eq!(c.point_at(-1.0), c.point_at(0.0));
        assert_eq!(c.point_at(2.0), c.point_at(1.0));
    }

    #[test]
    fn test_continuous() {
        let c = curve();
        let steps = 10_000;
        let mut previous = c.point_at(0.0);
        for i in 1..=steps {
            let point = c.point_at(i as f32 / steps as f32);
            assert!(point.distance(previous) < 0.5, "jump at step {i}");
            previous = point;
        }
        // Across the joint between the two segments.
        let left = c.point_at(0.5 - 1e-4);
        let right = c.point_at(0.5 + 1e-4);
        assert!(left.distance(right) < 0.1);
    }

    #[test]
    fn test_coincident_points_do_not_produce_nan() {
        let c = CatmullRomCurve3::new(vec![Vec3::ONE, Vec3::ONE, Vec3::ONE]).unwrap();
        let p = c.point_at(0.3);
        assert!(p.is_finite());
        assert!(p.abs_diff_eq(Vec3::ONE, 1e-6));
    }

    #[test]
    fn test_needs_two_points() {
        assert!(CatmullRomCurve3::new(vec![Vec3::ZERO]).is_none());
    }
}
