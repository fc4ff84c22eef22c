//! Unbalanced, points-in-leaves, explicit bounds, stack descent.
//!
//! Same sliding-midpoint build as [`crate::tree::unbalanced_implicit`], but each stem
//! additionally stores the cell's low/high extent along its own split dimension. That
//! lets search compute the distance from the query to the far child's half-cell
//! directly from the stored bounds instead of carrying an incremental `off` vector
//! through the recursion, trading memory per node for a tighter per-dim bound.

use crate::builder::sliding_midpoint_split;
use crate::cloud::{Bounds, Cloud};
use crate::error::Error;
use crate::flags::SearchFlags;
use crate::heap::BoundedHeap;
use crate::metric::{DistanceMetric, SquaredEuclidean};
use crate::scalar::Axis;
use crate::search::{validate_query, KnnSearch};
use crate::stats::{AtomicStats, Statistics};

/// A node in the flat pre-order array. A stem's `low`/`high` are the cell's extent
/// along its own `dim`, inherited from the parent cell and narrowed by the cut.
enum Node<A> {
    Stem {
        dim: usize,
        cut: A,
        low: A,
        high: A,
        right: usize,
    },
    Leaf {
        index: usize,
    },
}

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

    nodes.push(Node::Leaf { index: usize::MAX });
    let (dim, cut, pivot) = sliding_midpoint_split(cloud, indices, cell_min, cell_max);
    let low = cell_min[dim];
    let high = cell_max[dim];
    let (left, right) = indices.split_at_mut(pivot);

    let saved_max = cell_max[dim];
    cell_max[dim] = cut;
    build(cloud, left, cell_min, cell_max, nodes);
    cell_max[dim] = saved_max;

    let saved_min = cell_min[dim];
    cell_min[dim] = cut;
    let right_pos = build(cloud, right, cell_min, cell_max, nodes);
    cell_min[dim] = saved_min;

    nodes[pos] = Node::Stem { dim, cut, low, high, right: right_pos };
    pos
}

fn eps_factor<A: Axis>(eps: A) -> A {
    (A::one() + eps) * (A::one() + eps)
}

/// Unbalanced, points-in-leaves k-d tree storing explicit per-node cell bounds along
/// the split dimension, avoiding the incremental offset vector during search.
pub struct UnbalancedExplicitStack<'a, A> {
    cloud: Cloud<'a, A>,
    nodes: Vec<Node<A>>,
    stats: AtomicStats,
}

impl<'a, A: Axis> UnbalancedExplicitStack<'a, A> {
    /// Builds the tree from `data` (`dim`-major point chunks).
    pub fn new(data: &'a [A], dim: usize, bounds: &'a Bounds<A>) -> Result<Self, Error> {
        let cloud = Cloud::new(data, dim, bounds)?;
        #[cfg(feature = "tracing")]
        let _span = tracing::span!(tracing::Level::TRACE, "build_unbalanced_explicit", n = cloud.len(), dim).entered();

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

        Ok(UnbalancedExplicitStack {
            cloud,
            nodes,
            stats: AtomicStats::new(),
        })
    }

    /// Distance from `q` to the far child's half-cell along the split dimension.
    /// Using the stored `low`/`high` (rather than just the cut, as the implicit-bounds
    /// variants do) gives a tighter bound whenever `q` falls outside the whole cell:
    /// the far cell's outer wall, not just its inner boundary at `cut`, can reject it.
    #[inline]
    fn far_cell_dist<A2: Axis>(q: A2, cut: A2, low: A2, high: A2, went_left: bool) -> A2 {
        if went_left {
            // far child is the right half-cell: [cut, high]
            if q < cut {
                SquaredEuclidean::dist1(q, cut)
            } else if q > high {
                SquaredEuclidean::dist1(q, high)
            } else {
                A2::zero()
            }
        } else {
            // far child is the left half-cell: [low, cut]
            if q > cut {
                SquaredEuclidean::dist1(q, cut)
            } else if q < low {
                SquaredEuclidean::dist1(q, low)
            } else {
                A2::zero()
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn recurse(
        &self,
        query: &[A],
        pos: usize,
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
            Node::Stem { dim, cut, low, high, right } => {
                let dim = *dim;
                let cut = *cut;
                let left = pos + 1;
                let right = *right;
                let went_left = query[dim] < cut;
                let (near, far) = if went_left { (left, right) } else { (right, left) };

                self.recurse(query, near, factor, allow_self_match, heap, visits);

                let far_dist = Self::far_cell_dist(query[dim], cut, *low, *high, went_left);

                let prune = match heap.top_distance() {
                    Some(top) => far_dist * factor > top,
                    None => false,
                };
                if !prune {
                    self.recurse(query, far, factor, allow_self_match, heap, visits);
                }
            }
        }
    }
}

impl<'a, A: Axis> KnnSearch<A> for UnbalancedExplicitStack<'a, A> {
    fn knn(&self, query: &[A], k: usize, eps: A, flags: u32) -> Result<Vec<usize>, Error> {
        let flags = validate_query(query, self.cloud.dim(), k, self.cloud.len(), eps, flags)?;
        let allow_self_match = flags.contains(SearchFlags::ALLOW_SELF_MATCH);
        let factor = eps_factor(eps);

        let mut heap: BoundedHeap<A> = BoundedHeap::new(k);
        let mut visits = 0u64;
        self.recurse(query, 0, factor, allow_self_match, &mut heap, &mut visits);

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
