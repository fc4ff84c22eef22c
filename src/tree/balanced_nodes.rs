//! Balanced k-d tree with points stored in internal nodes, using the implicit
//! binary-heap array layout (child of `p` is at `2p+1`/`2p+2`).
//!
//! Two search strategies share the same build: a priority-queue best-first
//! descent ([`BalancedNodesPq`]) and a recursive stack descent carrying the
//! incremental offset/`rd` trick ([`BalancedNodesStack`]).

use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::builder::{select_median, spread_axis};
use crate::cloud::{Bounds, Cloud};
use crate::error::Error;
use crate::flags::SearchFlags;
use crate::heap::BoundedHeap;
use crate::metric::{DistanceMetric, SquaredEuclidean};
use crate::scalar::Axis;
use crate::search::{validate_query, KnnSearch};
use crate::stats::{AtomicStats, Statistics};

/// One occupied-or-empty position in the implicit-heap node array. `Empty` marks a
/// position with no subtree beneath it; `Filled` holds the cloud point stored at
/// that node and, when it has children, the axis it was split on.
#[derive(Clone, Debug)]
enum Slot<A> {
    Empty,
    Filled { point_index: usize, split: Option<usize> },
}

fn build<A: Axis>(cloud: &Cloud<A>, indices: &mut [usize], pos: usize, slots: &mut Vec<Slot<A>>) {
    if pos >= slots.len() {
        slots.resize(pos + 1, Slot::Empty);
    }

    if indices.len() == 1 {
        slots[pos] = Slot::Filled {
            point_index: indices[0],
            split: None,
        };
        return;
    }

    let axis = spread_axis(cloud, indices);
    let mid = select_median(cloud, indices, axis);
    let point_index = indices[mid];
    slots[pos] = Slot::Filled {
        point_index,
        split: Some(axis),
    };

    let (left, rest) = indices.split_at_mut(mid);
    let right = &mut rest[1..];

    if !left.is_empty() {
        build(cloud, left, 2 * pos + 1, slots);
    }
    if !right.is_empty() {
        build(cloud, right, 2 * pos + 2, slots);
    }
}

fn eps_factor<A: Axis>(eps: A) -> A {
    (A::one() + eps) * (A::one() + eps)
}

/// Balanced, points-in-nodes k-d tree searched with a best-first priority-queue
/// frontier: the most promising (lowest lower-bound-distance) subtree is always
/// expanded next.
pub struct BalancedNodesPq<'a, A> {
    cloud: Cloud<'a, A>,
    slots: Vec<Slot<A>>,
    stats: AtomicStats,
}

/// Balanced, points-in-nodes k-d tree searched with classical near-child-first
/// recursive descent, carrying the incremental offset vector through the stack.
pub struct BalancedNodesStack<'a, A> {
    cloud: Cloud<'a, A>,
    slots: Vec<Slot<A>>,
    stats: AtomicStats,
}

fn build_tree<'a, A: Axis>(
    data: &'a [A],
    dim: usize,
    bounds: &'a Bounds<A>,
) -> Result<(Cloud<'a, A>, Vec<Slot<A>>), Error> {
    let cloud = Cloud::new(data, dim, bounds)?;
    #[cfg(feature = "tracing")]
    let _span = tracing::span!(tracing::Level::TRACE, "build_balanced_nodes", n = cloud.len(), dim).entered();

    let mut indices: Vec<usize> = (0..cloud.len()).collect();
    let mut slots = vec![Slot::Empty; 1];
    build(&cloud, &mut indices, 0, &mut slots);

    #[cfg(feature = "tracing")]
    tracing::event!(tracing::Level::TRACE, slots = slots.len(), "tree built");

    #[cfg(debug_assertions)]
    crate::builder::debug_assert_build_invariants(
        dim,
        cloud.len(),
        slots.iter().filter_map(|s| match s {
            Slot::Filled { point_index, .. } => Some(*point_index),
            Slot::Empty => None,
        }),
        slots.iter().filter_map(|s| match s {
            Slot::Filled { split: Some(d), .. } => Some(*d),
            _ => None,
        }),
    );

    Ok((cloud, slots))
}

impl<'a, A: Axis> BalancedNodesPq<'a, A> {
    /// Builds the tree from `data` (`dim`-major point chunks).
    pub fn new(data: &'a [A], dim: usize, bounds: &'a Bounds<A>) -> Result<Self, Error> {
        let (cloud, slots) = build_tree(data, dim, bounds)?;
        Ok(BalancedNodesPq {
            cloud,
            slots,
            stats: AtomicStats::new(),
        })
    }
}

impl<'a, A: Axis> BalancedNodesStack<'a, A> {
    /// Builds the tree from `data` (`dim`-major point chunks).
    pub fn new(data: &'a [A], dim: usize, bounds: &'a Bounds<A>) -> Result<Self, Error> {
        let (cloud, slots) = build_tree(data, dim, bounds)?;
        Ok(BalancedNodesStack {
            cloud,
            slots,
            stats: AtomicStats::new(),
        })
    }
}

#[derive(Clone)]
struct FrontierEntry<A> {
    lower_bound: A,
    pos: usize,
    off: Vec<A>,
    rd: A,
}

impl<A: Axis> PartialEq for FrontierEntry<A> {
    fn eq(&self, other: &Self) -> bool {
        OrderedFloat(self.lower_bound) == OrderedFloat(other.lower_bound)
    }
}
impl<A: Axis> Eq for FrontierEntry<A> {}
impl<A: Axis> PartialOrd for FrontierEntry<A> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<A: Axis> Ord for FrontierEntry<A> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        OrderedFloat(self.lower_bound).cmp(&OrderedFloat(other.lower_bound))
    }
}

impl<'a, A: Axis> KnnSearch<A> for BalancedNodesPq<'a, A> {
    fn knn(&self, query: &[A], k: usize, eps: A, flags: u32) -> Result<Vec<usize>, Error> {
        let flags = validate_query(query, self.cloud.dim(), k, self.cloud.len(), eps, flags)?;
        let allow_self_match = flags.contains(SearchFlags::ALLOW_SELF_MATCH);
        let factor = eps_factor(eps);

        let mut heap: BoundedHeap<A> = BoundedHeap::new(k);
        let mut visits = 0u64;
        let mut frontier: BinaryHeap<Reverse<FrontierEntry<A>>> = BinaryHeap::new();
        frontier.push(Reverse(FrontierEntry {
            lower_bound: A::zero(),
            pos: 0,
            off: vec![A::zero(); self.cloud.dim()],
            rd: A::zero(),
        }));

        while let Some(Reverse(entry)) = frontier.pop() {
            if let Some(top) = heap.top_distance() {
                if entry.lower_bound * factor > top {
                    break;
                }
            }
            let (point_index, split) = match self.slots.get(entry.pos) {
                Some(Slot::Filled { point_index, split }) => (*point_index, *split),
                _ => continue,
            };
            visits += 1;
            let point = self.cloud.point(point_index);
            let d = SquaredEuclidean::dist(query, point);
            if d != A::zero() || allow_self_match {
                heap.try_insert(d, point_index);
            }

            if let Some(dim) = split {
                let cut = point[dim];
                let dist_to_cut = query[dim] - cut;
                let left = 2 * entry.pos + 1;
                let right = 2 * entry.pos + 2;
                let (near, far) = if query[dim] < cut { (left, right) } else { (right, left) };

                frontier.push(Reverse(FrontierEntry {
                    lower_bound: entry.rd,
                    pos: near,
                    off: entry.off.clone(),
                    rd: entry.rd,
                }));

                let mut far_off = entry.off.clone();
                let old = far_off[dim];
                let new_rd = A::rd_update(entry.rd, old, dist_to_cut);
                far_off[dim] = dist_to_cut;
                frontier.push(Reverse(FrontierEntry {
                    lower_bound: new_rd,
                    pos: far,
                    off: far_off,
                    rd: new_rd,
                }));
            }
        }

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

impl<'a, A: Axis> BalancedNodesStack<'a, A> {
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
        let (point_index, split) = match self.slots.get(pos) {
            Some(Slot::Filled { point_index, split }) => (*point_index, *split),
            _ => return,
        };
        *visits += 1;
        let point = self.cloud.point(point_index);
        let d = SquaredEuclidean::dist(query, point);
        if d != A::zero() || allow_self_match {
            heap.try_insert(d, point_index);
        }

        let dim = match split {
            Some(dim) => dim,
            None => return,
        };
        let cut = point[dim];
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

impl<'a, A: Axis> KnnSearch<A> for BalancedNodesStack<'a, A> {
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
