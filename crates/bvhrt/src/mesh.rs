//! Indexed polygon meshes to triangle primitives.

use bvhrt_math::Point3;
use log::warn;

use crate::error::{BvhError, Result};
use crate::primitive::Primitive;

/// Triangles whose doubled area falls below this are dropped.
pub const DEGENERATE_EPSILON: f32 = 1e-5;

/// Fan-triangulate every polygon into triangle primitives.
///
/// Polygon `k` with corners `p0..pn` yields `(p0, p[j-1], p[j])` for
/// `j in 2..=n`. Polygons with fewer than three corners produce nothing.
/// Every index is validated before any triangle of that polygon is emitted.
pub fn triangulate(vertices: &[Point3], polygons: &[Vec<usize>]) -> Result<Vec<Primitive>> {
    let mut triangles = Vec::with_capacity(
        polygons
            .iter()
            .map(|p| p.len().saturating_sub(2))
            .sum(),
    );
    let mut dropped = 0usize;

    for (polygon, corners) in polygons.iter().enumerate() {
        if let Some(&index) = corners.iter().find(|&&i| i >= vertices.len()) {
            return Err(BvhError::VertexIndexOutOfRange { polygon, index });
        }

        for j in 2..corners.len() {
            let v0 = vertices[corners[0]];
            let v1 = vertices[corners[j - 1]];
            let v2 = vertices[corners[j]];

            if (v1 - v0).cross(&(v2 - v0)).norm() < DEGENERATE_EPSILON {
                dropped += 1;
                continue;
            }
            triangles.push(Primitive::triangle(v0, v1, v2));
        }
    }

    if dropped > 0 {
        warn!("dropped {dropped} degenerate triangles during triangulation");
    }

    Ok(triangles)
}
