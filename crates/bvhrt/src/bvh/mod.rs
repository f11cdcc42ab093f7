//! Bounding Volume Hierarchy for accelerated ray queries.
//!
//! Built once with the Surface Area Heuristic (see [`Bvh::build`]) and immutable
//! afterwards. Nodes own their children; primitives are borrowed from the
//! caller and referenced by index.

mod build;
mod traverse;

pub use build::MAX_LEAF_PRIMITIVES;
pub use traverse::{Intersection, TraversalStats};

use crate::aabb::Aabb;
use crate::error::{BvhError, Result};
use crate::primitive::Primitive;

/// A BVH node - either a leaf containing primitives or an internal node with children.
#[derive(Debug, Clone, PartialEq)]
pub enum BvhNode {
    /// Leaf node containing primitive indices.
    Leaf {
        /// Union of the boxes of the contained primitives.
        aabb: Aabb,
        /// Indices into the primitive slice the hierarchy was built from.
        primitives: Vec<usize>,
    },
    /// Internal node with two children.
    Internal {
        /// Union of both children's boxes.
        aabb: Aabb,
        /// Left child node.
        left: Box<BvhNode>,
        /// Right child node.
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    /// Bounding box of this node.
    pub fn aabb(&self) -> &Aabb {
        match self {
            BvhNode::Leaf { aabb, .. } | BvhNode::Internal { aabb, .. } => aabb,
        }
    }

    /// `true` for leaves.
    pub fn is_leaf(&self) -> bool {
        matches!(self, BvhNode::Leaf { .. })
    }

    /// Primitive indices stored directly in this node (empty for internal nodes).
    pub fn primitives(&self) -> &[usize] {
        match self {
            BvhNode::Leaf { primitives, .. } => primitives,
            BvhNode::Internal { .. } => &[],
        }
    }

    /// Both children of an internal node.
    pub fn children(&self) -> Option<(&BvhNode, &BvhNode)> {
        match self {
            BvhNode::Leaf { .. } => None,
            BvhNode::Internal { left, right, .. } => Some((left, right)),
        }
    }

    /// Number of primitives stored in this subtree.
    pub fn primitive_count(&self) -> usize {
        match self {
            BvhNode::Leaf { primitives, .. } => primitives.len(),
            BvhNode::Internal { left, right, .. } => {
                left.primitive_count() + right.primitive_count()
            }
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        match self {
            BvhNode::Leaf { .. } => 1,
            BvhNode::Internal { left, right, .. } => 1 + left.node_count() + right.node_count(),
        }
    }

    /// Number of leaves in this subtree.
    pub fn leaf_count(&self) -> usize {
        match self {
            BvhNode::Leaf { .. } => 1,
            BvhNode::Internal { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    /// Number of internal nodes in this subtree.
    pub fn inner_count(&self) -> usize {
        match self {
            BvhNode::Leaf { .. } => 0,
            BvhNode::Internal { left, right, .. } => 1 + left.inner_count() + right.inner_count(),
        }
    }

    /// Largest primitive list of any leaf in this subtree.
    pub fn max_leaf_size(&self) -> usize {
        match self {
            BvhNode::Leaf { primitives, .. } => primitives.len(),
            BvhNode::Internal { left, right, .. } => left.max_leaf_size().max(right.max_leaf_size()),
        }
    }

    /// Number of levels in this subtree (a single leaf has depth 1).
    pub fn depth(&self) -> usize {
        match self {
            BvhNode::Leaf { .. } => 1,
            BvhNode::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    /// Sum of per-node SAH terms, with areas divided by `scale`.
    fn sah_terms(&self, scale: f32) -> f64 {
        let area = (self.aabb().surface_area() * scale) as f64;
        match self {
            BvhNode::Leaf { primitives, .. } => area * primitives.len() as f64,
            BvhNode::Internal { left, right, .. } => {
                area + left.sah_terms(scale) + right.sah_terms(scale)
            }
        }
    }

    /// Recursive structural check.
    ///
    /// Leaves must be non-empty with in-range indices that were not seen
    /// before; internal boxes must contain their children's boxes.
    fn check_node(&self, seen: &mut [bool]) -> Result<()> {
        match self {
            BvhNode::Leaf { aabb, primitives } => {
                if primitives.is_empty() {
                    return Err(BvhError::MalformedTree("empty leaf".into()));
                }
                if !aabb.is_valid() {
                    return Err(BvhError::MalformedTree("leaf with empty box".into()));
                }
                for &index in primitives {
                    let Some(slot) = seen.get_mut(index) else {
                        return Err(BvhError::MalformedTree(format!(
                            "primitive index {index} out of range"
                        )));
                    };
                    if *slot {
                        return Err(BvhError::MalformedTree(format!(
                            "primitive {index} stored twice"
                        )));
                    }
                    *slot = true;
                }
                Ok(())
            }
            BvhNode::Internal { aabb, left, right } => {
                if !aabb.contains_aabb(left.aabb()) || !aabb.contains_aabb(right.aabb()) {
                    return Err(BvhError::MalformedTree(
                        "child box escapes its parent".into(),
                    ));
                }
                left.check_node(seen)?;
                right.check_node(seen)
            }
        }
    }
}

/// Summary of a built hierarchy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhStats {
    /// Total number of nodes.
    pub node_count: usize,
    /// Number of leaves.
    pub leaf_count: usize,
    /// Number of internal nodes.
    pub inner_count: usize,
    /// Largest leaf.
    pub max_leaf_size: usize,
    /// Longest root-to-leaf path, in nodes.
    pub depth: usize,
    /// Estimated traversal cost: every node's area relative to the root,
    /// weighted by 1 for internal nodes and by primitive count for leaves.
    pub sah_cost: f64,
}

/// Bounding Volume Hierarchy over a borrowed primitive slice.
///
/// Queries take `&self` and keep all scratch state on the stack, so a
/// built hierarchy can be shared between threads.
#[derive(Debug, Clone)]
pub struct Bvh<'a> {
    root: BvhNode,
    primitives: &'a [Primitive],
}

impl<'a> Bvh<'a> {
    /// Root node.
    pub fn root(&self) -> &BvhNode {
        &self.root
    }

    /// The primitives the hierarchy was built from.
    pub fn primitives(&self) -> &'a [Primitive] {
        self.primitives
    }

    /// Number of primitives the hierarchy was built from.
    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    /// A single primitive by its original index.
    pub fn primitive(&self, index: usize) -> Option<&'a Primitive> {
        self.primitives.get(index)
    }

    /// Whole-tree consistency check.
    ///
    /// Verifies the leaf/internal invariant, box nesting, and that every
    /// primitive index appears in exactly one leaf.
    pub fn check(&self) -> Result<()> {
        let mut seen = vec![false; self.primitives.len()];
        self.root.check_node(&mut seen)?;
        if let Some(missing) = seen.iter().position(|&s| !s) {
            return Err(BvhError::MalformedTree(format!(
                "primitive {missing} is not in any leaf"
            )));
        }
        Ok(())
    }

    /// Node counts, depth and SAH cost of the tree.
    pub fn stats(&self) -> BvhStats {
        let root_area = self.root.aabb().surface_area();
        let scale = if root_area > 0.0 { 1.0 / root_area } else { 1.0 };

        BvhStats {
            node_count: self.root.node_count(),
            leaf_count: self.root.leaf_count(),
            inner_count: self.root.inner_count(),
            max_leaf_size: self.root.max_leaf_size(),
            depth: self.root.depth(),
            sah_cost: self.root.sah_terms(scale),
        }
    }
}
