//! Ray representation and the ray-box slab test.

use bvhrt_math::{Point3, Vec3};

use crate::aabb::Aabb;

/// A ray in 3D space defined by origin and direction.
///
/// The direction is kept as given, so hit parameters `t` are measured in
/// units of the direction vector's length.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Direction of the ray (not normalized).
    pub direction: Vec3,
    /// Precomputed reciprocal of direction components for fast AABB tests.
    inv_direction: Vec3,
}

impl Ray {
    /// Create a new ray from origin and direction.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        let inv_direction = Vec3::new(1.0 / direction.x, 1.0 / direction.y, 1.0 / direction.z);
        Self {
            origin,
            direction,
            inv_direction,
        }
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f32) -> Point3 {
        self.origin + self.direction * t
    }

    /// Test ray-AABB intersection using the slab method.
    ///
    /// Returns `Some((t_min, t_max))` with the entry parameter clipped to
    /// `t_min >= 0`, or `None` if the clipped range is empty.
    ///
    /// A zero direction component gives infinite slab bounds, which leaves
    /// the range untouched when the origin is inside that slab and empties it
    /// otherwise. A NaN bound (origin exactly on a plane of a parallel slab)
    /// is ignored by the comparisons.
    #[inline]
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<(f32, f32)> {
        let mut t_min = 0.0f32;
        let mut t_max = f32::MAX;

        for axis in 0..3 {
            let mut t0 = (aabb.min[axis] - self.origin[axis]) * self.inv_direction[axis];
            let mut t1 = (aabb.max[axis] - self.origin[axis]) * self.inv_direction[axis];
            if t1 < t0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            if t0 > t_min {
                t_min = t0;
            }
            if t1 < t_max {
                t_max = t1;
            }
        }

        (t_min <= t_max).then_some((t_min, t_max))
    }
}
