#![warn(missing_docs)]

//! Math types for the bvhrt ray tracing core.
//!
//! Thin wrappers around nalgebra providing the single precision points,
//! vectors and 4x4 transforms consumed by the hierarchy builder, the ray
//! queries and the camera drivers.

use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f32>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f32>;

/// A homogeneous 4-component vector.
pub type Vec4 = Vector4<f32>;

/// A 4x4 transformation matrix (column vectors, `M * p`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f32>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Wrap an existing matrix.
    pub fn from_matrix(matrix: Matrix4<f32>) -> Self {
        Self { matrix }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f32, dy: f32, dz: f32) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Non-uniform scale by `(sx, sy, sz)`.
    pub fn scale(sx: f32, sy: f32, sz: f32) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 0)] = sx;
        m[(1, 1)] = sy;
        m[(2, 2)] = sz;
        Self { matrix: m }
    }

    /// Rotation about the Y axis by `angle` radians.
    pub fn rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 2)] = s;
        m[(2, 0)] = -s;
        m[(2, 2)] = c;
        Self { matrix: m }
    }

    /// Rotation about the Z axis by `angle` radians.
    pub fn rotation_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 1)] = -s;
        m[(1, 0)] = s;
        m[(1, 1)] = c;
        Self { matrix: m }
    }

    /// OpenGL-style perspective projection (camera space to clip space).
    ///
    /// `fovy` is the vertical field of view in radians. Depth maps to
    /// `[-1, 1]` in normalized device coordinates.
    pub fn perspective(fovy: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            matrix: Matrix4::new_perspective(aspect, fovy, near, far),
        }
    }

    /// Right-handed view matrix placing `eye` at the origin looking at `target`.
    pub fn look_at(eye: &Point3, target: &Point3, up: &Vec3) -> Self {
        Self {
            matrix: Matrix4::look_at_rh(eye, target, up),
        }
    }

    /// Compose: `self` then `other` (self * other).
    ///
    /// Applying the result is `self(other(p))`.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point, ignoring the homogeneous row.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vec4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a homogeneous vector and divide by its `w` component.
    pub fn project(&self, v: &Vec4) -> Point3 {
        let r = self.matrix * v;
        Point3::new(r.x / r.w, r.y / r.w, r.z / r.w)
    }

    /// Transform a direction vector (ignores translation, applies rotation/scale).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vec4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    /// Transform a normal vector (uses inverse transpose of upper-left 3x3).
    pub fn apply_normal(&self, n: &Vec3) -> Vec3 {
        let m3: Matrix3<f32> = self.matrix.fixed_view::<3, 3>(0, 0).into_owned();
        match m3.try_inverse() {
            Some(inv) => inv.transpose() * n,
            // Singular linear part, nothing sensible to do
            None => *n,
        }
    }

    /// Inverse of this transform, if it exists.
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
