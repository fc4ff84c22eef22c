//! Unbalanced, points-in-leaves, implicit bounds, stack descent, tuned for query
//! throughput.
//!
//! Behaviourally identical to [`crate::tree::unbalanced_implicit::UnbalancedImplicitStack`];
//! differs only in three representation choices: leaves cache a raw pointer to the
//! point's coordinates instead of indirecting through the cloud on every distance
//! evaluation, the builder works on bare index arrays and a single min/max pass
//! rather than a full sort, and `allow_self_match` is threaded through the
//! recursion as a const generic so the zero-distance branch folds out of the hot
//! path.

use crate::builder::sliding_midpoint_split;
use crate::cloud::{Bounds, Cloud};
use crate::error::Error;
use crate::flags::SearchFlags;
use crate::heap::BoundedHeap;
use crate::metric::{DistanceMetric, SquaredEuclidean};
use crate::scalar::Axis;
use crate::search::{validate_query, KnnSearch};
use crate::stats::{AtomicStats, Statistics};

/// A node in the flat pre-order array. A leaf caches a raw pointer into the cloud's
/// backing buffer (valid for the lifetime of the `Cloud` the tree borrows from) so
/// the search hot path never has to compute `cloud.point(index)` from an index.
enum Node<A> {
    Stem {
        dim: usize,
        cut: A,
        right: usize,
    },
    Leaf {
        index: usize,
        point: *const A,
    },
}

// SAFETY: the raw pointer in `Node::Leaf` aliases the `Cloud` borrow the tree also
// holds; both are read-only for the tree's entire lifetime, so sharing across threads
// is exactly as sound as sharing the `Cloud` itself, which requires `A: Sync`.
unsafe impl<A: Sync> Sync for Node<A> {}
unsafe impl<A: Send> Send for Node<A> {}

fn build<A: Axis>(
    cloud: &Cloud<A>,
    indices: &mut [usize],
    cell_min: &mut Vec<A>,
    cell_max: &mut Vec<A>,
    nodes: &mut Vec<Node<A>>,
) -> usize {
    let pos = nodes.len();

    if indices.len() == 1 {
        let index = indices[0];
        nodes.push(Node::Leaf {
            index,
            point: cloud.point(index).as_ptr(),
        });
        return pos;
    }

    nodes.push(Node::Leaf {
        index: usize::MAX,
        point: std::ptr::null(),
    });
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

/// Unbalanced, points-in-leaves k-d tree with implicit bounds, tuned for query
/// throughput over [`crate::tree::unbalanced_implicit::UnbalancedImplicitStack`].
pub struct UnbalancedImplicitOptimised<'a, A> {
    cloud: Cloud<'a, A>,
    nodes: Vec<Node<A>>,
    dim: usize,
    stats: AtomicStats,
}

impl<'a, A: Axis> UnbalancedImplicitOptimised<'a, A> {
    /// Builds the tree from `data` (`dim`-major point chunks).
    pub fn new(data: &'a [A], dim: usize, bounds: &'a Bounds<A>) -> Result<Self, Error> {
        let cloud = Cloud::new(data, dim, bounds)?;
        #[cfg(feature = "tracing")]
        let _span = tracing::span!(tracing::Level::TRACE, "build_unbalanced_implicit_opt", n = cloud.len(), dim).entered();

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
                Node::Leaf { index, .. } => Some(*index),
                Node::Stem { .. } => None,
            }),
            nodes.iter().filter_map(|node| match node {
                Node::Stem { dim, .. } => Some(*dim),
                Node::Leaf { .. } => None,
            }),
        );

        Ok(UnbalancedImplicitOptimised {
            cloud,
            nodes,
            dim,
            stats: AtomicStats::new(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn recurse<const ALLOW_SELF_MATCH: bool>(
        &self,
        query: &[A],
        pos: usize,
        off: &mut [A],
        rd: A,
        factor: A,
        heap: &mut BoundedHeap<A>,
        visits: &mut u64,
    ) {
        *visits += 1;
        match &self.nodes[pos] {
            Node::Leaf { index, point } => {
                // SAFETY: `point` was derived from `self.cloud` at build time and the
                // cloud outlives the tree, and is a `dim`-long contiguous run because
                // the cloud is stored point-major.
                let coords = unsafe { std::slice::from_raw_parts(*point, self.dim) };
                let d = SquaredEuclidean::dist(query, coords);
                if ALLOW_SELF_MATCH || d != A::zero() {
                    heap.try_insert(d, *index);
                }
            }
            Node::Stem { dim, cut, right } => {
                let dim = *dim;
                let cut = *cut;
                let left = pos + 1;
                let right = *right;
                let (near, far) = if query[dim] < cut { (left, right) } else { (right, left) };

                self.recurse::<ALLOW_SELF_MATCH>(query, near, off, rd, factor, heap, visits);

                let dist_to_cut = query[dim] - cut;
                let old_off = off[dim];
                let new_rd = A::rd_update(rd, old_off, dist_to_cut);

                let prune = match heap.top_distance() {
                    Some(top) => new_rd * factor > top,
                    None => false,
                };
                if !prune {
                    off[dim] = dist_to_cut;
                    self.recurse::<ALLOW_SELF_MATCH>(query, far, off, new_rd, factor, heap, visits);
                    off[dim] = old_off;
                }
            }
        }
    }

    fn knn_impl(&self, query: &[A], k: usize, eps: A, flags: u32, allow_self_match: bool) -> Result<Vec<(A, usize)>, Error> {
        let flags = validate_query(query, self.dim, k, self.cloud.len(), eps, flags)?;
        let factor = eps_factor(eps);

        let mut heap: BoundedHeap<A> = BoundedHeap::new(k);
        let mut off = vec![A::zero(); self.dim];
        let mut visits = 0u64;
        if allow_self_match {
            self.recurse::<true>(query, 0, &mut off, A::zero(), factor, &mut heap, &mut visits);
        } else {
            self.recurse::<false>(query, 0, &mut off, A::zero(), factor, &mut heap, &mut visits);
        }

        self.stats.record_query(visits);
        let results = if flags.contains(SearchFlags::SORT_RESULTS) {
            heap.drain_sorted()
        } else {
            heap.drain_unsorted()
        };
        Ok(results)
    }
}

impl<'a, A: Axis> KnnSearch<A> for UnbalancedImplicitOptimised<'a, A> {
    fn knn(&self, query: &[A], k: usize, eps: A, flags: u32) -> Result<Vec<usize>, Error> {
        let allow_self_match = flags & SearchFlags::ALLOW_SELF_MATCH.bits() != 0;
        let results = self.knn_impl(query, k, eps, flags, allow_self_match)?;
        Ok(results.into_iter().map(|(_, i)| i).collect())
    }

    fn statistics(&self) -> Statistics {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brute_force::BruteForce;
    use crate::tree::unbalanced_implicit::UnbalancedImplicitStack;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn matches_brute_force_and_unoptimised_variant() {
        let mut rng = StdRng::seed_from_u64(123);
        let n = 400;
        let dim = 4;
        let data: Vec<f64> = (0..n * dim).map(|_| rng.gen_range(0.0..1.0)).collect();
        let bounds = Bounds::compute(&data, dim);

        let opt = UnbalancedImplicitOptimised::new(&data, dim, &bounds).unwrap();
        let plain = UnbalancedImplicitStack::new(&data, dim, &bounds).unwrap();
        let bf = BruteForce::new(&data, dim, &bounds).unwrap();

        for _ in 0..20 {
            let q: Vec<f64> = (0..dim).map(|_| rng.gen_range(0.0..1.0)).collect();
            let mut expected = bf.knn(&q, 6, 0.0, 0).unwrap();
            let mut got_opt = opt.knn(&q, 6, 0.0, 0).unwrap();
            let mut got_plain = plain.knn(&q, 6, 0.0, 0).unwrap();
            expected.sort_unstable();
            got_opt.sort_unstable();
            got_plain.sort_unstable();
            assert_eq!(got_opt, expected);
            assert_eq!(got_plain, expected);
        }
    }

    #[test]
    fn self_match_const_generic_paths_agree_with_runtime_flag() {
        let data = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let bounds = Bounds::compute(&data, 2);
        let tree = UnbalancedImplicitOptimised::new(&data, 2, &bounds).unwrap();

        let without = tree.knn(&[0.0, 0.0], 1, 0.0, 0).unwrap();
        assert!(!without.contains(&0));

        let with = tree
            .knn(&[0.0, 0.0], 1, 0.0, SearchFlags::ALLOW_SELF_MATCH.bits())
            .unwrap();
        assert_eq!(with, vec![0]);
    }
}
