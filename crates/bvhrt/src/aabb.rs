//! Axis-aligned bounding boxes.

use bvhrt_math::{Point3, Vec3};

/// Axis-aligned bounding box in 3D.
///
/// A freshly created [`Aabb::empty`] box has `min = +inf` and `max = -inf`,
/// so the first point it grows by becomes both corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb {
    /// Create an AABB from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) AABB suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    /// Smallest box containing both `a` and `b`.
    pub fn union(a: &Aabb, b: &Aabb) -> Self {
        let mut out = *a;
        out.grow_aabb(b);
        out
    }

    /// Expand this AABB to include a point.
    pub fn grow(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Expand this AABB to include another box.
    ///
    /// Growing by an empty box is a no-op.
    pub fn grow_aabb(&mut self, other: &Aabb) {
        self.grow(&other.min);
        self.grow(&other.max);
    }

    /// Test if a point lies inside the box (boundary inclusive).
    pub fn contains(&self, p: &Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Test if `other` lies entirely inside this box.
    pub fn contains_aabb(&self, other: &Aabb) -> bool {
        self.contains(&other.min) && self.contains(&other.max)
    }

    /// Vector from the min corner to the max corner.
    pub fn diagonal(&self) -> Vec3 {
        self.max - self.min
    }

    /// Volume of the box.
    pub fn volume(&self) -> f32 {
        let d = self.diagonal();
        d.x * d.y * d.z
    }

    /// Surface area of the box.
    pub fn surface_area(&self) -> f32 {
        let d = self.diagonal();
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    /// Midpoint of the box along one axis (0 = x, 1 = y, 2 = z).
    #[inline]
    pub fn centroid(&self, axis: usize) -> f32 {
        self.min[axis] * 0.5 + self.max[axis] * 0.5
    }

    /// `true` when `min <= max` on every axis.
    ///
    /// An empty box is never valid, which is how callers detect that
    /// nothing was ever added to it.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Cell `(x, y, z)` of a regular `w x h x d` subdivision of this box.
    pub fn sub_aabb(&self, x: u32, y: u32, z: u32, w: u32, h: u32, d: u32) -> Aabb {
        let lerp = |lo: f32, hi: f32, f: f32| hi * f + lo * (1.0 - f);

        let fx1 = x as f32 / w as f32;
        let fy1 = y as f32 / h as f32;
        let fz1 = z as f32 / d as f32;
        let fx2 = (x + 1) as f32 / w as f32;
        let fy2 = (y + 1) as f32 / h as f32;
        let fz2 = (z + 1) as f32 / d as f32;

        Aabb {
            min: Point3::new(
                lerp(self.min.x, self.max.x, fx1),
                lerp(self.min.y, self.max.y, fy1),
                lerp(self.min.z, self.max.z, fz1),
            ),
            max: Point3::new(
                lerp(self.min.x, self.max.x, fx2),
                lerp(self.min.y, self.max.y, fy2),
                lerp(self.min.z, self.max.z, fz2),
            ),
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> Aabb {
        Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 2.0, 3.0))
    }

    #[test]
    fn test_empty_is_invalid() {
        let aabb = Aabb::empty();
        assert!(!aabb.is_valid());
        assert_eq!(Aabb::default(), aabb);
    }

    #[test]
    fn test_first_point_becomes_both_corners() {
        let mut aabb = Aabb::empty();
        let p = Point3::new(1.0, -2.0, 3.0);
        aabb.grow(&p);
        assert!(aabb.is_valid());
        assert_eq!(aabb.min, p);
        assert_eq!(aabb.max, p);
        assert_eq!(aabb.volume(), 0.0);
    }

    #[test]
    fn test_grow_by_box() {
        let mut aabb = unit_box();
        aabb.grow_aabb(&Aabb::new(
            Point3::new(-1.0, 1.0, 1.0),
            Point3::new(0.5, 5.0, 2.0),
        ));
        assert_eq!(aabb.min, Point3::new(-1.0, 0.0, 0.0));
        assert_eq!(aabb.max, Point3::new(1.0, 5.0, 3.0));
    }

    #[test]
    fn test_grow_by_empty_is_noop() {
        let mut aabb = unit_box();
        aabb.grow_aabb(&Aabb::empty());
        assert_eq!(aabb, unit_box());
    }

    #[test]
    fn test_contains() {
        let aabb = unit_box();
        assert!(aabb.contains(&Point3::new(0.5, 1.0, 1.5)));
        assert!(aabb.contains(&Point3::new(1.0, 2.0, 3.0)));
        assert!(!aabb.contains(&Point3::new(1.1, 1.0, 1.0)));
        assert!(!Aabb::empty().contains(&Point3::origin()));
    }

    #[test]
    fn test_measures() {
        let aabb = unit_box();
        assert_eq!(aabb.diagonal(), Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(aabb.volume(), 6.0);
        // 2 * (1*2 + 1*3 + 2*3)
        assert_relative_eq!(aabb.surface_area(), 22.0);
        assert_relative_eq!(aabb.centroid(0), 0.5);
        assert_relative_eq!(aabb.centroid(2), 1.5);
    }

    #[test]
    fn test_union() {
        let a = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Point3::new(2.0, 2.0, 2.0), Point3::new(3.0, 3.0, 3.0));
        let u = Aabb::union(&a, &b);
        assert!(u.contains_aabb(&a));
        assert!(u.contains_aabb(&b));
        assert_relative_eq!(u.volume(), 27.0);
    }

    #[test]
    fn test_sub_aabb() {
        let aabb = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 4.0, 4.0));
        let cell = aabb.sub_aabb(1, 0, 3, 4, 2, 4);
        assert_relative_eq!(cell.min.x, 1.0);
        assert_relative_eq!(cell.max.x, 2.0);
        assert_relative_eq!(cell.min.y, 0.0);
        assert_relative_eq!(cell.max.y, 2.0);
        assert_relative_eq!(cell.min.z, 3.0);
        assert_relative_eq!(cell.max.z, 4.0);
        assert!(aabb.contains_aabb(&cell));
    }
}
