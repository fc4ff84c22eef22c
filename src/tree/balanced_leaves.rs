//! Balanced k-d tree with points stored only in leaves; internal nodes hold just a
//! split axis and cut value. Searched with the same stack descent and incremental
//! offset/`rd` trick as the points-in-nodes stack variant.

use crate::builder::{median_split, spread_axis};
use crate::cloud::{Bounds, Cloud};
use crate::error::Error;
use crate::flags::SearchFlags;
use crate::heap::BoundedHeap;
use crate::metric::{DistanceMetric, SquaredEuclidean};
use crate::scalar::Axis;
use crate::search::{validate_query, KnnSearch};
use crate::stats::{AtomicStats, Statistics};

#[derive(Clone, Debug)]
enum Slot<A> {
    Empty,
    Stem { dim: usize, cut: A },
    Leaf { index: usize },
}

fn build<A: Axis>(
    cloud: &Cloud<A>,
    indices: &mut [usize],
    cycle_dim: usize,
    pos: usize,
    balance_variance: bool,
    slots: &mut Vec<Slot<A>>,
) {
    if pos >= slots.len() {
        slots.resize(pos + 1, Slot::Empty);
    }

    if indices.len() == 1 {
        slots[pos] = Slot::Leaf { index: indices[0] };
        return;
    }

    let axis = if balance_variance {
        spread_axis(cloud, indices)
    } else {
        cycle_dim % cloud.dim()
    };

    let mid = indices.len() / 2;
    let pivot = median_split(cloud, indices, axis, mid);
    let cut = cloud.point(indices[pivot])[axis];
    slots[pos] = Slot::Stem { dim: axis, cut };

    let (left, right) = indices.split_at_mut(pivot);
    let next_cycle = cycle_dim + 1;
    build(cloud, left, next_cycle, 2 * pos + 1, balance_variance, slots);
    build(cloud, right, next_cycle, 2 * pos + 2, balance_variance, slots);
}

fn eps_factor<A: Axis>(eps: A) -> A {
    (A::one() + eps) * (A::one() + eps)
}

/// Balanced, points-in-leaves k-d tree.
pub struct BalancedLeavesStack<'a, A> {
    cloud: Cloud<'a, A>,
    slots: Vec<Slot<A>>,
    stats: AtomicStats,
}

impl<'a, A: Axis> BalancedLeavesStack<'a, A> {
    /// Builds the tree from `data` (`dim`-major point chunks). `balance_variance`
    /// selects the largest-spread axis at each split when true; when false, the
    /// split axis cycles through dimensions round-robin.
    pub fn new(
        data: &'a [A],
        dim: usize,
        bounds: &'a Bounds<A>,
        balance_variance: bool,
    ) -> Result<Self, Error> {
        let cloud = Cloud::new(data, dim, bounds)?;
        #[cfg(feature = "tracing")]
        let _span = tracing::span!(tracing::Level::TRACE, "build_balanced_leaves", n = cloud.len(), dim, balance_variance).entered();

        let mut indices: Vec<usize> = (0..cloud.len()).collect();
        let mut slots = vec![Slot::Empty; 1];
        build(&cloud, &mut indices, 0, 0, balance_variance, &mut slots);

        #[cfg(feature = "tracing")]
        tracing::event!(tracing::Level::TRACE, slots = slots.len(), "tree built");

        #[cfg(debug_assertions)]
        crate::builder::debug_assert_build_invariants(
            dim,
            cloud.len(),
            slots.iter().filter_map(|s| match s {
                Slot::Leaf { index } => Some(*index),
                _ => None,
            }),
            slots.iter().filter_map(|s| match s {
                Slot::Stem { dim, .. } => Some(*dim),
                _ => None,
            }),
        );

        Ok(BalancedLeavesStack {
            cloud,
            slots,
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
        let slot = match self.slots.get(pos) {
            Some(Slot::Empty) | None => return,
            Some(s) => s.clone(),
        };
        *visits += 1;

        match slot {
            Slot::Empty => {}
            Slot::Leaf { index } => {
                let point = self.cloud.point(index);
                let d = SquaredEuclidean::dist(query, point);
                if d != A::zero() || allow_self_match {
                    heap.try_insert(d, index);
                }
            }
            Slot::Stem { dim, cut } => {
                let left = 2 * pos + 1;
                let right = 2 * pos + 2;
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

impl<'a, A: Axis> KnnSearch<A> for BalancedLeavesStack<'a, A> {
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
