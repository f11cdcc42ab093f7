//! Geometric primitives referenced by the hierarchy.
//!
//! A [`Primitive`] is a small immutable value: a kind tag, three points whose
//! meaning depends on the kind, and an attribute mask. The hierarchy only ever
//! stores indices into the caller's primitive slice.

use bitflags::bitflags;
use bvhrt_math::{Point3, Transform, Vec3};

use crate::aabb::Aabb;

/// Shape of a primitive and the meaning of its three points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// `v0`, `v1`, `v2` are the triangle corners.
    Triangle,
    /// `v0` is a corner, `v1` and `v2` are the two edge vectors leaving it.
    Parallelogram,
    /// `v0` is the position, `v2` holds a normal when [`Attributes::NORMAL`] is set.
    Point,
}

bitflags! {
    /// Optional per-primitive attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attributes: u32 {
        /// The primitive carries an explicit normal.
        const NORMAL = 1 << 0;
    }
}

/// Parameters of a ray-primitive hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitiveHit {
    /// Parameter along the (unnormalized) ray direction.
    pub t: f32,
    /// First surface coordinate.
    pub u: f32,
    /// Second surface coordinate.
    pub v: f32,
}

/// A triangle, parallelogram or point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primitive {
    kind: PrimitiveKind,
    v0: Point3,
    v1: Vec3,
    v2: Vec3,
    attributes: Attributes,
}

impl Primitive {
    /// Triangle with corners `v0`, `v1`, `v2`.
    pub fn triangle(v0: Point3, v1: Point3, v2: Point3) -> Self {
        Self {
            kind: PrimitiveKind::Triangle,
            v0,
            v1: v1.coords,
            v2: v2.coords,
            attributes: Attributes::empty(),
        }
    }

    /// Parallelogram spanned by `edge_u` and `edge_v` from `origin`.
    pub fn parallelogram(origin: Point3, edge_u: Vec3, edge_v: Vec3) -> Self {
        Self {
            kind: PrimitiveKind::Parallelogram,
            v0: origin,
            v1: edge_u,
            v2: edge_v,
            attributes: Attributes::empty(),
        }
    }

    /// A bare point.
    pub fn point(position: Point3) -> Self {
        Self {
            kind: PrimitiveKind::Point,
            v0: position,
            v1: Vec3::zeros(),
            v2: Vec3::zeros(),
            attributes: Attributes::empty(),
        }
    }

    /// A point carrying a normal.
    pub fn oriented_point(position: Point3, normal: Vec3) -> Self {
        Self {
            kind: PrimitiveKind::Point,
            v0: position,
            v1: Vec3::zeros(),
            v2: normal,
            attributes: Attributes::NORMAL,
        }
    }

    /// Kind tag.
    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    /// Attribute mask.
    pub fn attributes(&self) -> Attributes {
        self.attributes
    }

    /// Test a single attribute bit.
    pub fn has_attribute(&self, attr: Attributes) -> bool {
        self.attributes.contains(attr)
    }

    /// The three stored points, verbatim.
    ///
    /// For parallelograms the last two are edge vectors, not positions.
    pub fn raw_points(&self) -> [Point3; 3] {
        [self.v0, Point3::from(self.v1), Point3::from(self.v2)]
    }

    /// `true` if every stored coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.v0.coords.iter().all(|c| c.is_finite())
            && self.v1.iter().all(|c| c.is_finite())
            && self.v2.iter().all(|c| c.is_finite())
    }

    /// Bounding box of the primitive.
    pub fn aabb(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        aabb.grow(&self.v0);

        match self.kind {
            PrimitiveKind::Triangle => {
                aabb.grow(&Point3::from(self.v1));
                aabb.grow(&Point3::from(self.v2));
            }
            PrimitiveKind::Parallelogram => {
                aabb.grow(&(self.v0 + self.v1));
                aabb.grow(&(self.v0 + self.v2));
                aabb.grow(&(self.v0 + self.v1 + self.v2));
            }
            PrimitiveKind::Point => {}
        }

        aabb
    }

    /// Intersect the ray `origin + t * direction` with this primitive.
    ///
    /// Returns `None` for misses, hits behind the origin, and points (which
    /// have no area). Degenerate determinants produce infinities or NaN that
    /// fail the range checks.
    pub fn intersect(&self, origin: &Point3, direction: &Vec3) -> Option<PrimitiveHit> {
        match self.kind {
            PrimitiveKind::Triangle => {
                let e1 = self.v1 - self.v0.coords;
                let e2 = self.v2 - self.v0.coords;
                self.intersect_edges(origin, direction, &e1, &e2, false)
            }
            PrimitiveKind::Parallelogram => {
                self.intersect_edges(origin, direction, &self.v1, &self.v2, true)
            }
            PrimitiveKind::Point => None,
        }
    }

    /// Möller-Trumbore against the edges `e1`, `e2` leaving `v0`.
    fn intersect_edges(
        &self,
        origin: &Point3,
        direction: &Vec3,
        e1: &Vec3,
        e2: &Vec3,
        parallelogram: bool,
    ) -> Option<PrimitiveHit> {
        let p = direction.cross(e2);
        let det = e1.dot(&p);
        let inv_det = 1.0 / det;

        let to_origin = *origin - self.v0;

        let u = to_origin.dot(&p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = to_origin.cross(e1);
        let v = direction.dot(&q) * inv_det;
        let inside = if parallelogram {
            (0.0..=1.0).contains(&v)
        } else {
            v >= 0.0 && u + v <= 1.0
        };
        if !inside {
            return None;
        }

        let t = e2.dot(&q) * inv_det;
        if t.is_nan() || t < 0.0 {
            return None;
        }

        Some(PrimitiveHit { t, u, v })
    }

    /// Geometric normal (not normalized).
    pub fn normal(&self, _u: f32, _v: f32) -> Vec3 {
        match self.kind {
            PrimitiveKind::Triangle => {
                (self.v1 - self.v0.coords).cross(&(self.v2 - self.v0.coords))
            }
            PrimitiveKind::Parallelogram => self.v1.cross(&self.v2),
            PrimitiveKind::Point => self.v2,
        }
    }

    /// Surface position at `(u, v)`, matching the coordinates returned by
    /// [`Primitive::intersect`].
    pub fn sample_position(&self, u: f32, v: f32) -> Point3 {
        match self.kind {
            PrimitiveKind::Triangle => {
                self.v0 + (self.v1 - self.v0.coords) * u + (self.v2 - self.v0.coords) * v
            }
            PrimitiveKind::Parallelogram => self.v0 + self.v1 * u + self.v2 * v,
            PrimitiveKind::Point => self.v0,
        }
    }

    /// A copy of this primitive under `transform`.
    pub fn transformed(&self, transform: &Transform) -> Self {
        let v0 = transform.apply_point(&self.v0);
        let (v1, v2) = match self.kind {
            PrimitiveKind::Triangle => (
                transform.apply_point(&Point3::from(self.v1)).coords,
                transform.apply_point(&Point3::from(self.v2)).coords,
            ),
            PrimitiveKind::Parallelogram => {
                (transform.apply_vec(&self.v1), transform.apply_vec(&self.v2))
            }
            PrimitiveKind::Point => (self.v1, transform.apply_normal(&self.v2)),
        };

        Self { v0, v1, v2, ..*self }
    }
}
