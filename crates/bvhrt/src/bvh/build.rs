//! Top-down SAH construction.
//!
//! Each subset is sorted by box centroid along every axis in turn and swept
//! from both ends to price every split position. The cheapest split is taken
//! only if it beats leaving the subset as a single leaf.

use log::{debug, trace};

use super::{Bvh, BvhNode};
use crate::aabb::Aabb;
use crate::error::{BvhError, Result};
use crate::primitive::Primitive;

/// Subsets of at most this many primitives always become a leaf.
pub const MAX_LEAF_PRIMITIVES: usize = 3;

/// Winning split of a subset.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Split {
    /// Axis the subset is sorted along (0 = x, 1 = y, 2 = z).
    axis: usize,
    /// Number of primitives that go to the left child.
    position: usize,
    /// SAH cost of the split.
    cost: f32,
}

impl<'a> Bvh<'a> {
    /// Build a BVH over `primitives` using SAH construction.
    ///
    /// The slice must outlive the hierarchy; it is never copied or modified.
    ///
    /// # Panics
    ///
    /// Panics if the constructed tree fails [`Bvh::check`], which would be a
    /// bug in the builder rather than a property of the input.
    pub fn build(primitives: &'a [Primitive]) -> Result<Self> {
        if primitives.is_empty() {
            return Err(BvhError::EmptyInput);
        }
        if let Some(index) = primitives.iter().position(|p| !p.is_finite()) {
            return Err(BvhError::NonFinitePrimitive { index });
        }

        let aabbs: Vec<Aabb> = primitives.iter().map(Primitive::aabb).collect();
        let mut indices: Vec<usize> = (0..primitives.len()).collect();

        let root = build_node(&aabbs, &mut indices);
        let bvh = Self { root, primitives };

        if let Err(err) = bvh.check() {
            panic!("BVH builder produced an inconsistent tree: {err}");
        }

        let stats = bvh.stats();
        debug!(
            "built BVH over {} primitives: {} nodes ({} leaves, {} inner), depth {}, max leaf {}, SAH cost {:.3}",
            primitives.len(),
            stats.node_count,
            stats.leaf_count,
            stats.inner_count,
            stats.depth,
            stats.max_leaf_size,
            stats.sah_cost,
        );

        Ok(bvh)
    }
}

/// Recursively build a node over `indices`, reordering them in place.
fn build_node(aabbs: &[Aabb], indices: &mut [usize]) -> BvhNode {
    if indices.len() <= MAX_LEAF_PRIMITIVES {
        return build_leaf(aabbs, indices);
    }

    let bounds = union_of(aabbs, indices);

    let Some(split) = find_best_split(aabbs, indices, &bounds) else {
        trace!("no split beats a leaf of {} primitives", indices.len());
        return build_leaf(aabbs, indices);
    };
    trace!(
        "split {} primitives on axis {} at {} (cost {})",
        indices.len(),
        split.axis,
        split.position,
        split.cost
    );

    sort_by_centroid(aabbs, indices, split.axis);
    let (left, right) = indices.split_at_mut(split.position);

    BvhNode::Internal {
        aabb: bounds,
        left: Box::new(build_node(aabbs, left)),
        right: Box::new(build_node(aabbs, right)),
    }
}

fn build_leaf(aabbs: &[Aabb], indices: &[usize]) -> BvhNode {
    BvhNode::Leaf {
        aabb: union_of(aabbs, indices),
        primitives: indices.to_vec(),
    }
}

fn union_of(aabbs: &[Aabb], indices: &[usize]) -> Aabb {
    let mut aabb = Aabb::empty();
    for &i in indices {
        aabb.grow_aabb(&aabbs[i]);
    }
    aabb
}

/// Sort by box centroid along `axis`, ties broken by primitive index.
///
/// The order is total, so re-sorting along the winning axis reproduces
/// exactly the order the split was priced on.
fn sort_by_centroid(aabbs: &[Aabb], indices: &mut [usize], axis: usize) {
    indices.sort_unstable_by(|&a, &b| {
        aabbs[a]
            .centroid(axis)
            .total_cmp(&aabbs[b].centroid(axis))
            .then(a.cmp(&b))
    });
}

/// Find the cheapest split over all axes and positions.
///
/// Starts from the cost of not splitting (`area * count`) and only accepts
/// strictly cheaper candidates, so the first minimum found wins ties.
/// Leaves `indices` sorted along the last axis tried.
fn find_best_split(aabbs: &[Aabb], indices: &mut [usize], bounds: &Aabb) -> Option<Split> {
    let n = indices.len();
    let mut best_cost = bounds.surface_area() * n as f32;
    let mut best = None;

    // left_cost[i]: primitives 0..=i on the left; right_cost[i]: primitives i.. on the right
    let mut left_cost = vec![0.0f32; n];
    let mut right_cost = vec![0.0f32; n];

    for axis in 0..3 {
        sort_by_centroid(aabbs, indices, axis);

        let mut left_aabb = Aabb::empty();
        let mut right_aabb = Aabb::empty();

        for i in 0..n {
            left_aabb.grow_aabb(&aabbs[indices[i]]);
            left_cost[i] = left_aabb.surface_area() * (i + 1) as f32;

            right_aabb.grow_aabb(&aabbs[indices[n - i - 1]]);
            right_cost[n - i - 1] = right_aabb.surface_area() * (i + 1) as f32;
        }

        for position in 1..n {
            let cost = left_cost[position - 1] + right_cost[position];
            if cost < best_cost {
                best_cost = cost;
                best = Some(Split {
                    axis,
                    position,
                    cost,
                });
            }
        }
    }

    best
}
