#![warn(missing_docs)]

//! SAH bounding volume hierarchy for nearest-hit ray queries.
//!
//! This crate organizes a static slice of triangles, parallelograms and
//! points into a binary BVH, answers closest-hit ray queries against it, and
//! flattens the finished tree into plain arrays for a GPU traversal kernel.
//!
//! # Architecture
//!
//! - [`Aabb`] - Axis-aligned bounding box
//! - [`Primitive`] - Triangle / parallelogram / point with ray intersection
//! - [`Ray`] - Ray with precomputed inverse direction for slab tests
//! - [`Bvh`] - Hierarchy construction and traversal
//! - [`FlatBvh`] - Pre-order flat buffers with sign-encoded child references
//! - [`mesh`] - Indexed polygon triangulation
//!
//! # Example
//!
//! ```
//! use bvhrt::{Bvh, Primitive};
//! use bvhrt_math::{Point3, Vec3};
//!
//! let prims = vec![Primitive::triangle(
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! )];
//! let bvh = Bvh::build(&prims).unwrap();
//!
//! let hit = bvh
//!     .intersect(&Point3::new(0.2, 0.2, 1.0), &Vec3::new(0.0, 0.0, -1.0))
//!     .unwrap();
//! assert_eq!(hit.primitive, 0);
//!
//! let flat = bvh.flatten().unwrap();
//! assert!(flat.root_is_leaf());
//! ```

mod aabb;
pub mod bvh;
mod error;
mod flat;
pub mod mesh;
mod primitive;
mod ray;

pub use aabb::Aabb;
pub use bvh::{Bvh, BvhNode, BvhStats, Intersection, TraversalStats, MAX_LEAF_PRIMITIVES};
pub use error::{BvhError, Result};
pub use flat::{ChildRef, FlatBvh, FlatNode, MAX_FLAT_INDEX};
pub use primitive::{Attributes, Primitive, PrimitiveHit, PrimitiveKind};
pub use ray::Ray;
