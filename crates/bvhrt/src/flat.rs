//! Flat array layout of a finished hierarchy for GPU traversal kernels.
//!
//! Nodes are numbered in pre-order (self, left subtree, right subtree), so
//! the root is entry 0 and every child index is at least 1. For an internal
//! node, `left`/`right` hold the children's indices, negated when the child
//! is a leaf. For a leaf, `left` is the offset of its first vertex and
//! `right` its vertex count. Because 0 is never a child, the sign test is
//! unambiguous; only the root itself can be a leaf at entry 0, which
//! [`FlatBvh::root_is_leaf`] reports.

use bytemuck::{Pod, Zeroable};
use bvhrt_math::{Point3, Vec3};
use log::{debug, warn};

use crate::bvh::{Bvh, BvhNode, Intersection};
use crate::error::{BvhError, Result};
use crate::primitive::{Primitive, PrimitiveKind};
use crate::Ray;

/// Largest node index or vertex offset representable in the encoding.
pub const MAX_FLAT_INDEX: usize = i32::MAX as usize;

/// GPU-compatible node entry.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct FlatNode {
    /// Internal: encoded left child. Leaf: first vertex offset.
    pub left: i32,
    /// Internal: encoded right child. Leaf: vertex count.
    pub right: i32,
}

/// A decoded child reference of an internal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildRef {
    /// Continue traversal at this internal node.
    Inner(usize),
    /// Read triangle data from this leaf node.
    Leaf(usize),
}

impl ChildRef {
    /// Decode a raw child value. Returns `None` for 0, which is never a child.
    pub fn decode(raw: i32) -> Option<Self> {
        match raw {
            0 => None,
            r if r > 0 => Some(ChildRef::Inner(r as usize)),
            r => Some(ChildRef::Leaf(r.unsigned_abs() as usize)),
        }
    }

    /// Node index this reference points at.
    pub fn index(self) -> usize {
        match self {
            ChildRef::Inner(i) | ChildRef::Leaf(i) => i,
        }
    }
}

/// Flattened hierarchy: node topology, per-axis child boxes and vertex data.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatBvh {
    /// Node entries in pre-order.
    pub nodes: Vec<FlatNode>,
    /// `[left.min.x, left.max.x, right.min.x, right.max.x]` per internal node.
    pub aabbs_x: Vec<[f32; 4]>,
    /// Same as [`FlatBvh::aabbs_x`] for the Y axis.
    pub aabbs_y: Vec<[f32; 4]>,
    /// Same as [`FlatBvh::aabbs_x`] for the Z axis.
    pub aabbs_z: Vec<[f32; 4]>,
    /// `[x, y, z, 1]` corners, three per primitive, in leaf pre-order.
    pub vertices: Vec<[f32; 4]>,
    /// Original primitive index of each three-vertex slot.
    pub primitive_ids: Vec<u32>,
    leaf: Vec<bool>,
    non_triangles: usize,
}

impl FlatBvh {
    /// Flatten `bvh` into a fresh set of buffers.
    pub fn from_bvh(bvh: &Bvh<'_>) -> Result<Self> {
        let root = bvh.root();
        let node_count = root.node_count();
        if node_count > MAX_FLAT_INDEX {
            return Err(BvhError::TooManyNodes(node_count));
        }
        let vertex_count = bvh.primitive_count() * 3;
        if vertex_count > MAX_FLAT_INDEX {
            return Err(BvhError::TooManyVertices(vertex_count));
        }

        let mut flat = Self {
            nodes: vec![FlatNode::zeroed(); node_count],
            aabbs_x: vec![[0.0; 4]; node_count],
            aabbs_y: vec![[0.0; 4]; node_count],
            aabbs_z: vec![[0.0; 4]; node_count],
            vertices: Vec::with_capacity(vertex_count),
            primitive_ids: Vec::with_capacity(bvh.primitive_count()),
            leaf: vec![false; node_count],
            non_triangles: 0,
        };

        let end = flat.convert(bvh.primitives(), root, 0);
        debug_assert_eq!(end, node_count);

        if flat.non_triangles > 0 {
            warn!(
                "flattened {} non-triangle primitives; their slots hold raw points and are traced as triangles",
                flat.non_triangles
            );
        }

        debug!(
            "flattened BVH: {} nodes, {} vertices ({} bytes total)",
            flat.nodes.len(),
            flat.vertices.len(),
            flat.byte_size()
        );

        Ok(flat)
    }

    /// Write `node` at `idx` and its subtree after it; returns the next free index.
    fn convert(&mut self, primitives: &[Primitive], node: &BvhNode, idx: usize) -> usize {
        let mut next = idx + 1;

        match node {
            BvhNode::Internal { left, right, .. } => {
                let left_idx = next;
                next = self.convert(primitives, left, next);
                let right_idx = next;
                next = self.convert(primitives, right, next);

                self.nodes[idx] = FlatNode {
                    left: encode_child(left, left_idx),
                    right: encode_child(right, right_idx),
                };

                let (l, r) = (left.aabb(), right.aabb());
                for (axis, boxes) in [&mut self.aabbs_x, &mut self.aabbs_y, &mut self.aabbs_z]
                    .into_iter()
                    .enumerate()
                {
                    boxes[idx] = [l.min[axis], l.max[axis], r.min[axis], r.max[axis]];
                }
            }
            BvhNode::Leaf {
                primitives: indices,
                ..
            } => {
                self.leaf[idx] = true;
                self.nodes[idx] = FlatNode {
                    left: self.vertices.len() as i32,
                    right: (indices.len() * 3) as i32,
                };

                for &index in indices {
                    if primitives[index].kind() != PrimitiveKind::Triangle {
                        self.non_triangles += 1;
                    }
                    for corner in primitives[index].raw_points() {
                        self.vertices.push([corner.x, corner.y, corner.z, 1.0]);
                    }
                    self.primitive_ids.push(index as u32);
                }
            }
        }

        next
    }

    /// `true` when the whole tree is a single leaf stored at entry 0.
    pub fn root_is_leaf(&self) -> bool {
        self.is_leaf(0)
    }

    /// `true` when entry `idx` is a leaf, whose fields are a vertex range.
    pub fn is_leaf(&self, idx: usize) -> bool {
        self.leaf.get(idx).copied().unwrap_or(false)
    }

    /// Number of flattened primitives that are not triangles.
    ///
    /// Their slots hold the raw stored points, so [`FlatBvh::intersect`]
    /// and any kernel reading the vertex blob only agree with the tree
    /// query when this is zero.
    pub fn non_triangle_count(&self) -> usize {
        self.non_triangles
    }

    /// Number of node entries.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Decoded children of an internal node entry; `None` for leaves and
    /// out-of-range indices.
    pub fn children(&self, idx: usize) -> Option<(ChildRef, ChildRef)> {
        if self.leaf.get(idx).copied().unwrap_or(true) {
            return None;
        }
        let node = self.nodes.get(idx)?;
        Some((ChildRef::decode(node.left)?, ChildRef::decode(node.right)?))
    }

    /// Raw bytes of the node buffer.
    pub fn node_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.nodes)
    }

    /// Raw bytes of the child-box buffer for `axis` (0 = x, 1 = y, 2 = z).
    ///
    /// # Panics
    ///
    /// Panics if `axis > 2`.
    pub fn aabb_bytes(&self, axis: usize) -> &[u8] {
        let boxes = match axis {
            0 => &self.aabbs_x,
            1 => &self.aabbs_y,
            2 => &self.aabbs_z,
            _ => panic!("axis {axis} out of range"),
        };
        bytemuck::cast_slice(boxes)
    }

    /// Raw bytes of the vertex buffer.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Total size of all buffers in bytes.
    pub fn byte_size(&self) -> usize {
        self.node_bytes().len()
            + (0..3).map(|axis| self.aabb_bytes(axis).len()).sum::<usize>()
            + self.vertex_bytes().len()
    }

    /// Closest hit computed by walking the flat buffers the way a kernel would.
    ///
    /// Every primitive slot is treated as a triangle, so this matches
    /// [`Bvh::intersect`] only for triangle scenes.
    pub fn intersect(&self, origin: &Point3, direction: &Vec3) -> Option<Intersection> {
        let ray = Ray::new(*origin, *direction);
        let mut closest = None;

        if self.nodes.is_empty() {
            return None;
        }
        if self.root_is_leaf() {
            self.intersect_leaf(0, &ray, &mut closest);
            return closest;
        }

        let mut stack = Vec::with_capacity(64);
        stack.push(0usize);

        while let Some(idx) = stack.pop() {
            let node = self.nodes[idx];
            for (raw, lo) in [(node.left, 0), (node.right, 2)] {
                if ray.intersect_aabb(&self.child_aabb(idx, lo)).is_none() {
                    continue;
                }
                match ChildRef::decode(raw) {
                    Some(ChildRef::Inner(child)) => stack.push(child),
                    Some(ChildRef::Leaf(child)) => self.intersect_leaf(child, &ray, &mut closest),
                    None => {}
                }
            }
        }

        closest
    }

    /// Box of one child of internal node `idx`; `lo` is 0 for left, 2 for right.
    fn child_aabb(&self, idx: usize, lo: usize) -> crate::Aabb {
        let (x, y, z) = (self.aabbs_x[idx], self.aabbs_y[idx], self.aabbs_z[idx]);
        crate::Aabb::new(
            Point3::new(x[lo], y[lo], z[lo]),
            Point3::new(x[lo + 1], y[lo + 1], z[lo + 1]),
        )
    }

    fn intersect_leaf(&self, leaf: usize, ray: &Ray, closest: &mut Option<Intersection>) {
        let FlatNode { left, right } = self.nodes[leaf];
        let start = left as usize;
        let end = start + right as usize;
        let corner = |v: &[f32; 4]| Point3::new(v[0], v[1], v[2]);

        for (slot, tri) in self.vertices[start..end].chunks_exact(3).enumerate() {
            let prim = Primitive::triangle(corner(&tri[0]), corner(&tri[1]), corner(&tri[2]));
            let Some(hit) = prim.intersect(&ray.origin, &ray.direction) else {
                continue;
            };
            if closest.map_or(true, |best| hit.t < best.t) {
                *closest = Some(Intersection {
                    primitive: self.primitive_ids[start / 3 + slot] as usize,
                    t: hit.t,
                    u: hit.u,
                    v: hit.v,
                });
            }
        }
    }
}

impl Bvh<'_> {
    /// Flatten this hierarchy for upload. See [`FlatBvh`].
    pub fn flatten(&self) -> Result<FlatBvh> {
        FlatBvh::from_bvh(self)
    }
}

/// Positive index for internal children, negative for leaves.
fn encode_child(child: &BvhNode, idx: usize) -> i32 {
    let idx = idx as i32;
    if child.is_leaf() {
        -idx
    } else {
        idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn unit_triangle(x: f32, y: f32, z: f32) -> Primitive {
        Primitive::triangle(
            Point3::new(x, y, z),
            Point3::new(x + 1.0, y, z),
            Point3::new(x, y + 1.0, z),
        )
    }

    fn random_scene(count: usize, seed: u64) -> Vec<Primitive> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                let x = rng.gen_range(-30.0..30.0);
                let y = rng.gen_range(-30.0..30.0);
                let z = rng.gen_range(-30.0..30.0);
                Primitive::triangle(
                    Point3::new(x, y, z),
                    Point3::new(x + rng.gen_range(0.5..2.0), y, z + rng.gen_range(-1.0..1.0)),
                    Point3::new(x, y + rng.gen_range(0.5..2.0), z),
                )
            })
            .collect()
    }

    /// Assign pre-order indices the same way the flattener does.
    fn preorder<'n>(node: &'n BvhNode, out: &mut Vec<&'n BvhNode>) {
        out.push(node);
        if let Some((left, right)) = node.children() {
            preorder(left, out);
            preorder(right, out);
        }
    }

    #[test]
    fn test_single_leaf_root() {
        let prims = [unit_triangle(0.0, 0.0, 0.0), unit_triangle(5.0, 0.0, 0.0)];
        let bvh = Bvh::build(&prims).unwrap();
        let flat = bvh.flatten().unwrap();

        assert!(flat.root_is_leaf());
        assert_eq!(flat.nodes, vec![FlatNode { left: 0, right: 6 }]);
        assert_eq!(flat.vertices.len(), 6);
        assert!(flat.children(0).is_none());
    }

    #[test]
    fn test_two_leaf_layout() {
        let prims = [
            unit_triangle(0.0, 0.0, 0.0),
            unit_triangle(100.0, 0.0, 0.0),
            unit_triangle(0.5, 0.0, 0.0),
            unit_triangle(100.5, 0.0, 0.0),
        ];
        let bvh = Bvh::build(&prims).unwrap();
        let flat = bvh.flatten().unwrap();

        assert!(!flat.root_is_leaf());
        assert_eq!(
            flat.nodes,
            vec![
                FlatNode { left: -1, right: -2 },
                FlatNode { left: 0, right: 6 },
                FlatNode { left: 6, right: 6 },
            ]
        );
        assert_eq!(flat.aabbs_x[0], [0.0, 1.5, 100.0, 101.5]);
        assert_eq!(flat.aabbs_y[0], [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(flat.aabbs_z[0], [0.0, 0.0, 0.0, 0.0]);
        // Leaves carry no child boxes
        assert_eq!(flat.aabbs_x[1], [0.0; 4]);

        let mut left_ids = flat.primitive_ids[..2].to_vec();
        left_ids.sort_unstable();
        assert_eq!(left_ids, vec![0, 2]);
        assert_eq!(flat.vertices[0][3], 1.0);
    }

    #[test]
    fn test_child_references_decode_to_preorder_indices() {
        let prims = random_scene(400, 3);
        let bvh = Bvh::build(&prims).unwrap();
        let flat = bvh.flatten().unwrap();

        let mut order = Vec::new();
        preorder(bvh.root(), &mut order);
        assert_eq!(order.len(), flat.node_count());

        for (idx, node) in order.iter().enumerate() {
            let Some((left, right)) = node.children() else {
                continue;
            };
            let (l, r) = flat.children(idx).unwrap();

            assert!(l.index() >= 1 && r.index() >= 1);
            assert!(std::ptr::eq(order[l.index()], left));
            assert!(std::ptr::eq(order[r.index()], right));
            assert_eq!(matches!(l, ChildRef::Leaf(_)), left.is_leaf());
            assert_eq!(matches!(r, ChildRef::Leaf(_)), right.is_leaf());

            // The leaf entry points at its own primitives
            for (child_ref, child) in [(l, left), (r, right)] {
                if let ChildRef::Leaf(leaf) = child_ref {
                    let entry = flat.nodes[leaf];
                    let start = entry.left as usize / 3;
                    let count = entry.right as usize / 3;
                    let ids: Vec<usize> = flat.primitive_ids[start..start + count]
                        .iter()
                        .map(|&id| id as usize)
                        .collect();
                    assert_eq!(ids, child.primitives());
                }
            }
        }
    }

    #[test]
    fn test_children_of_leaf_entries_are_none() {
        let prims = [
            unit_triangle(0.0, 0.0, 0.0),
            unit_triangle(100.0, 0.0, 0.0),
            unit_triangle(0.5, 0.0, 0.0),
            unit_triangle(100.5, 0.0, 0.0),
        ];
        let bvh = Bvh::build(&prims).unwrap();
        let flat = bvh.flatten().unwrap();

        // Entry 2 stores (6, 6): a vertex range, not two node indices
        assert_eq!(flat.nodes[2], FlatNode { left: 6, right: 6 });
        assert!(flat.is_leaf(1) && flat.is_leaf(2));
        assert!(!flat.is_leaf(0));
        assert_eq!(flat.children(1), None);
        assert_eq!(flat.children(2), None);
        assert_eq!(flat.children(3), None);
        assert_eq!(
            flat.children(0),
            Some((ChildRef::Leaf(1), ChildRef::Leaf(2)))
        );
    }

    #[test]
    fn test_children_stay_in_range() {
        let prims = random_scene(400, 12);
        let bvh = Bvh::build(&prims).unwrap();
        let flat = bvh.flatten().unwrap();

        let mut internal = 0;
        for idx in 0..flat.node_count() {
            match flat.children(idx) {
                Some((l, r)) => {
                    internal += 1;
                    assert!(!flat.is_leaf(idx));
                    for child in [l, r] {
                        assert!(child.index() < flat.node_count());
                        assert_eq!(matches!(child, ChildRef::Leaf(_)), flat.is_leaf(child.index()));
                    }
                }
                None => assert!(flat.is_leaf(idx)),
            }
        }
        assert_eq!(internal, bvh.stats().inner_count);
    }

    #[test]
    fn test_non_triangle_primitives_are_counted() {
        let prims = [
            unit_triangle(0.0, 0.0, 0.0),
            Primitive::parallelogram(
                Point3::new(5.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ),
            Primitive::oriented_point(Point3::new(9.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
        ];
        let bvh = Bvh::build(&prims).unwrap();
        assert_eq!(bvh.flatten().unwrap().non_triangle_count(), 2);

        let triangles = random_scene(20, 1);
        let bvh = Bvh::build(&triangles).unwrap();
        assert_eq!(bvh.flatten().unwrap().non_triangle_count(), 0);
    }

    #[test]
    fn test_decode_zero_is_reserved() {
        assert_eq!(ChildRef::decode(0), None);
        assert_eq!(ChildRef::decode(5), Some(ChildRef::Inner(5)));
        assert_eq!(ChildRef::decode(-5), Some(ChildRef::Leaf(5)));
    }

    #[test]
    fn test_flatten_is_deterministic() {
        let prims = random_scene(300, 8);
        let bvh = Bvh::build(&prims).unwrap();
        let a = bvh.flatten().unwrap();
        let b = bvh.flatten().unwrap();

        assert_eq!(a.node_bytes(), b.node_bytes());
        for axis in 0..3 {
            assert_eq!(a.aabb_bytes(axis), b.aabb_bytes(axis));
        }
        assert_eq!(a.vertex_bytes(), b.vertex_bytes());
        assert_eq!(a, b);
    }

    #[test]
    fn test_every_primitive_written_once() {
        let prims = random_scene(250, 4);
        let bvh = Bvh::build(&prims).unwrap();
        let flat = bvh.flatten().unwrap();

        assert_eq!(flat.vertices.len(), prims.len() * 3);
        let mut ids: Vec<u32> = flat.primitive_ids.clone();
        ids.sort_unstable();
        assert_eq!(ids, (0..prims.len() as u32).collect::<Vec<_>>());

        for (slot, &id) in flat.primitive_ids.iter().enumerate() {
            let [v0, v1, v2] = prims[id as usize].raw_points();
            assert_eq!(flat.vertices[slot * 3], [v0.x, v0.y, v0.z, 1.0]);
            assert_eq!(flat.vertices[slot * 3 + 1], [v1.x, v1.y, v1.z, 1.0]);
            assert_eq!(flat.vertices[slot * 3 + 2], [v2.x, v2.y, v2.z, 1.0]);
        }
    }

    #[test]
    fn test_byte_views_have_expected_sizes() {
        let prims = random_scene(50, 6);
        let bvh = Bvh::build(&prims).unwrap();
        let flat = bvh.flatten().unwrap();
        let n = flat.node_count();

        assert_eq!(flat.node_bytes().len(), n * 8);
        assert_eq!(flat.aabb_bytes(1).len(), n * 16);
        assert_eq!(flat.vertex_bytes().len(), prims.len() * 3 * 16);
        assert_eq!(flat.byte_size(), n * 8 + 3 * n * 16 + prims.len() * 48);
    }

    #[test]
    fn test_flat_walk_matches_tree_query() {
        let prims = random_scene(1500, 10);
        let bvh = Bvh::build(&prims).unwrap();
        let flat = bvh.flatten().unwrap();
        let mut rng = StdRng::seed_from_u64(77);

        for _ in 0..400 {
            let origin = Point3::new(
                rng.gen_range(-60.0..60.0),
                rng.gen_range(-60.0..60.0),
                rng.gen_range(-60.0..60.0),
            );
            let target = Point3::new(
                rng.gen_range(-25.0..25.0),
                rng.gen_range(-25.0..25.0),
                rng.gen_range(-25.0..25.0),
            );
            let dir = target - origin;
            assert_eq!(flat.intersect(&origin, &dir), bvh.intersect(&origin, &dir));
        }
    }

    #[test]
    fn test_flat_walk_on_single_leaf() {
        let prims = [unit_triangle(0.0, 0.0, 0.0)];
        let bvh = Bvh::build(&prims).unwrap();
        let flat = bvh.flatten().unwrap();
        let hit = flat
            .intersect(&Point3::new(0.2, 0.2, 1.0), &Vec3::new(0.0, 0.0, -1.0))
            .unwrap();
        assert_eq!(hit.primitive, 0);
        assert!((hit.t - 1.0).abs() < 1e-6);
    }
}
