//! Unbalanced k-d tree, points-in-leaves, implicit bounds: sliding-midpoint build,
//! stack descent with the incremental offset/`rd` trick, cell bounds re-derived
//! during descent rather than stored per node.

use crate::builder::sliding_midpoint_split;
use crate::cloud::{Bounds, Cloud};
use crate::error::Error;
use crate::flags::SearchFlags;
use crate::heap::BoundedHeap;
use crate::metric::{DistanceMetric, SquaredEuclidean};
use crate::scalar::Axis;
use crate::search::{validate_query, KnnSearch};
use crate::stats::{AtomicStats, Statistics};

/// A node in the flat, pre-order array: a leaf's left/right children don't exist;
/// a stem's left child is always the immediately following array entry, and its
/// right child lives at the stored `right` index.
enum Node<A> {
    Stem { dim: usize, cut: A, right: usize },
    Leaf { index: usize },
}

/// Builds the flat pre-order node array over `indices`, returning the index of the
/// subtree root just written (always equal to `nodes.len()` before the call).
fn build<A: Axis>(
    cloud: &Cloud<A>,
    indices: &mut [usize],
    cell_min: &mut Vec<A>,
    cell_max: &mut Vec<A>,
    nodes: &mut Vec<Node<A>>,
) -> usize {
    let pos = nodes.len();

    if indices.len() == 1 {
        nodes.push(Node::Leaf { index: indices[0] });
        return pos;
    }

    nodes.push(Node::Leaf { index: usize::MAX }); // placeholder, patched below
    let (dim, cut, pivot) = sliding_midpoint_split(cloud, indices, cell_min, cell_max);
    let (left, right) = indices.split_at_mut(pivot);

    let saved_max = cell_max[dim];
    cell_max[dim] = cut;
    build(cloud, left, cell_min, cell_max, nodes);
    cell_max[dim] = saved_max;

    let saved_min = cell_min[dim];
    cell_min[dim] = cut;
    let right_pos = build(cloud, right, cell_min, cell_max, nodes);
    cell_min[dim] = saved_min;

    nodes[pos] = Node::Stem { dim, cut, right: right_pos };
    pos
}

fn eps_factor<A: Axis>(eps: A) -> A {
    (A::one() + eps) * (A::one() + eps)
}

/// Unbalanced, points-in-leaves k-d tree with implicit (re-derived, not stored)
/// per-node bounds.
pub struct UnbalancedImplicitStack<'a, A> {
    cloud: Cloud<'a, A>,
    nodes: Vec<Node<A>>,
    stats: AtomicStats,
}

impl<'a, A: Axis> UnbalancedImplicitStack<'a, A> {
    /// Builds the tree from `data` (`dim`-major point chunks).
    pub fn new(data: &'a [A], dim: usize, bounds: &'a Bounds<A>) -> Result<Self, Error> {
        let cloud = Cloud::new(data, dim, bounds)?;
        #[cfg(feature = "tracing")]
        let _span = tracing::span!(tracing::Level::TRACE, "build_unbalanced_implicit", n = cloud.len(), dim).entered();

        let mut indices: Vec<usize> = (0..cloud.len()).collect();
        let mut cell_min = cloud.min_bound().to_vec();
        let mut cell_max = cloud.max_bound().to_vec();
        let mut nodes = Vec::with_capacity(2 * cloud.len());
        build(&cloud, &mut indices, &mut cell_min, &mut cell_max, &mut nodes);

        #[cfg(feature = "tracing")]
        tracing::event!(tracing::Level::TRACE, nodes = nodes.len(), "tree built");

        #[cfg(debug_assertions)]
        crate::builder::debug_assert_build_invariants(
            dim,
            cloud.len(),
            nodes.iter().filter_map(|node| match node {
                Node::Leaf { index } => Some(*index),
                Node::Stem { .. } => None,
            }),
            nodes.iter().filter_map(|node| match node {
                Node::Stem { dim, .. } => Some(*dim),
                Node::Leaf { .. } => None,
            }),
        );

        Ok(UnbalancedImplicitStack {
            cloud,
            nodes,
            stats: AtomicStats::new(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn recurse(
        &self,
        query: &[A],
        pos: usize,
        off: &mut [A],
        rd: A,
        factor: A,
        allow_self_match: bool,
        heap: &mut BoundedHeap<A>,
        visits: &mut u64,
    ) {
        *visits += 1;
        match &self.nodes[pos] {
            Node::Leaf { index } => {
                let point = self.cloud.point(*index);
                let d = SquaredEuclidean::dist(query, point);
                if d != A::zero() || allow_self_match {
                    heap.try_insert(d, *index);
                }
            }
            Node::Stem { dim, cut, right } => {
                let dim = *dim;
                let cut = *cut;
                let left = pos + 1;
                let right = *right;
                let (near, far) = if query[dim] < cut { (left, right) } else { (right, left) };

                self.recurse(query, near, off, rd, factor, allow_self_match, heap, visits);

                let dist_to_cut = query[dim] - cut;
                let old_off = off[dim];
                let new_rd = A::rd_update(rd, old_off, dist_to_cut);

                let prune = match heap.top_distance() {
                    Some(top) => new_rd * factor > top,
                    None => false,
                };
                if !prune {
                    off[dim] = dist_to_cut;
                    self.recurse(query, far, off, new_rd, factor, allow_self_match, heap, visits);
                    off[dim] = old_off;
                }
            }
        }
    }
}

impl<'a, A: Axis> KnnSearch<A> for UnbalancedImplicitStack<'a, A> {
    fn knn(&self, query: &[A], k: usize, eps: A, flags: u32) -> Result<Vec<usize>, Error> {
        let flags = validate_query(query, self.cloud.dim(), k, self.cloud.len(), eps, flags)?;
        let allow_self_match = flags.contains(SearchFlags::ALLOW_SELF_MATCH);
        let factor = eps_factor(eps);

        let mut heap: BoundedHeap<A> = BoundedHeap::new(k);
        let mut off = vec![A::zero(); self.cloud.dim()];
        let mut visits = 0u64;
        self.recurse(query, 0, &mut off, A::zero(), factor, allow_self_match, &mut heap, &mut visits);

        self.stats.record_query(visits);
        let results = if flags.contains(SearchFlags::SORT_RESULTS) {
            heap.drain_sorted()
        } else {
            heap.drain_unsorted()
        };
        Ok(results.into_iter().map(|(_, i)| i).collect())
    }

    fn statistics(&self) -> Statistics {
        self.stats.snapshot()
    }
}
