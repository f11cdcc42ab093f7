//! Closest-hit ray queries.

use bvhrt_math::{Point3, Vec3};

use super::{Bvh, BvhNode};
use crate::Ray;

/// Closest hit of a ray query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Index of the hit primitive in the slice the hierarchy was built from.
    pub primitive: usize,
    /// Parameter along the ray direction.
    pub t: f32,
    /// First surface coordinate.
    pub u: f32,
    /// Second surface coordinate.
    pub v: f32,
}

/// Work done by a single query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Nodes popped from the work list, including the ones whose box was missed.
    pub nodes_visited: usize,
    /// Primitive intersection tests performed.
    pub primitives_tested: usize,
}

impl Bvh<'_> {
    /// Closest hit along `origin + t * direction` with `t >= 0`.
    ///
    /// `direction` need not be normalized.
    pub fn intersect(&self, origin: &Point3, direction: &Vec3) -> Option<Intersection> {
        self.intersect_ray(&Ray::new(*origin, *direction))
    }

    /// Closest hit along a prepared ray.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<Intersection> {
        self.intersect_with_stats(ray).0
    }

    /// Closest hit along `ray`, plus traversal counters.
    ///
    /// Subtrees are skipped only when the ray misses their box; nodes are
    /// not culled against the best hit found so far.
    pub fn intersect_with_stats(&self, ray: &Ray) -> (Option<Intersection>, TraversalStats) {
        let mut stats = TraversalStats::default();
        let mut closest: Option<Intersection> = None;

        let mut stack: Vec<&BvhNode> = Vec::with_capacity(64);
        stack.push(&self.root);

        while let Some(node) = stack.pop() {
            stats.nodes_visited += 1;

            if ray.intersect_aabb(node.aabb()).is_none() {
                continue;
            }

            match node {
                BvhNode::Internal { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
                BvhNode::Leaf { primitives, .. } => {
                    for &index in primitives {
                        stats.primitives_tested += 1;

                        let Some(hit) =
                            self.primitives[index].intersect(&ray.origin, &ray.direction)
                        else {
                            continue;
                        };

                        if closest.map_or(true, |best| hit.t < best.t) {
                            closest = Some(Intersection {
                                primitive: index,
                                t: hit.t,
                                u: hit.u,
                                v: hit.v,
                            });
                        }
                    }
                }
            }
        }

        (closest, stats)
    }
}
