//! Shared build-time helpers: axis selection and partial-sort partitioning.
//!
//! Every tree variant's builder reduces to the same two primitives: "which axis do
//! we split on" and "where, among a working slice of point indices, does the split
//! fall", so they live here once rather than being reimplemented per variant.

use ordered_float::OrderedFloat;

use crate::cloud::Cloud;
use crate::scalar::Axis;

/// Picks the axis of largest spread (max - min) over the points named by `indices`,
/// ties broken toward the lower axis number.
pub fn spread_axis<A: Axis>(cloud: &Cloud<A>, indices: &[usize]) -> usize {
    let dim = cloud.dim();
    let mut min = vec![A::infinity(); dim];
    let mut max = vec![A::neg_infinity(); dim];
    for &i in indices {
        let p = cloud.point(i);
        for d in 0..dim {
            if p[d] < min[d] {
                min[d] = p[d];
            }
            if p[d] > max[d] {
                max[d] = p[d];
            }
        }
    }
    let mut best_dim = 0;
    let mut best_spread = max[0] - min[0];
    for d in 1..dim {
        let spread = max[d] - min[d];
        if spread > best_spread {
            best_spread = spread;
            best_dim = d;
        }
    }
    best_dim
}

/// Partitions `indices` in place so that `indices[..pivot]` holds the `pivot` points
/// whose coordinate along `dim` is smallest, and `indices[pivot..]` the rest, with
/// `indices[pivot]` landing at or near the split point requested by `target_pivot`.
///
/// Ties straddling the pivot are nudged left so that every point equal to the cut
/// value ends up on the left side, which is what lets the caller record a single cut
/// value at the node and preserve the "left <= cut <= right" invariant. The nudge is
/// capped at half of `target_pivot`: a run of equal values long enough to reach that
/// floor means this axis is degenerate over (much of) the slice, and sliding all the
/// way to the end would turn the tree into a near-linked-list, so the split stays
/// positional instead.
pub fn median_split<A: Axis>(
    cloud: &Cloud<A>,
    indices: &mut [usize],
    dim: usize,
    target_pivot: usize,
) -> usize {
    let mut pivot = target_pivot;
    if pivot == 0 || pivot >= indices.len() {
        return pivot.min(indices.len());
    }

    indices.select_nth_unstable_by_key(pivot, |&i| OrderedFloat(cloud.point(i)[dim]));

    let floor = (target_pivot / 2).max(1);
    while pivot > floor && cloud.point(indices[pivot])[dim] == cloud.point(indices[pivot - 1])[dim] {
        pivot -= 1;
    }

    pivot
}

/// Partitions `indices` around the true median position along `dim`, returning that
/// position. Unlike [`median_split`], ties at the boundary are left where
/// `select_nth_unstable_by_key` puts them: the points-in-nodes variant stores the
/// median point itself at the tree node, so which side a tied neighbour falls on
/// doesn't affect the left-<=-node-<=-right invariant.
pub fn select_median<A: Axis>(cloud: &Cloud<A>, indices: &mut [usize], dim: usize) -> usize {
    let mid = indices.len() / 2;
    indices.select_nth_unstable_by_key(mid, |&i| OrderedFloat(cloud.point(i)[dim]));
    mid
}

/// The sliding-midpoint splitting rule (ANN's `ANN_KD_SL_MIDPT`): pick the split
/// axis as the longest side of the cell `[cell_min, cell_max]`, propose a cut at its
/// midpoint, and if that would leave one side empty, slide the cut to the extreme
/// value on the minority side so at least one point is isolated there instead.
///
/// Returns `(dim, cut, pivot)` where `indices[..pivot]` is the left (<= cut) subset
/// after partitioning in place.
pub fn sliding_midpoint_split<A: Axis>(
    cloud: &Cloud<A>,
    indices: &mut [usize],
    cell_min: &[A],
    cell_max: &[A],
) -> (usize, A, usize) {
    let dim_count = cell_min.len();
    let mut dim = 0;
    let mut best_extent = cell_max[0] - cell_min[0];
    for d in 1..dim_count {
        let extent = cell_max[d] - cell_min[d];
        if extent > best_extent {
            best_extent = extent;
            dim = d;
        }
    }

    let midpoint = cell_min[dim] + (cell_max[dim] - cell_min[dim]) / (A::one() + A::one());

    let mut pivot = partition_by_cut(cloud, indices, dim, midpoint);

    let cut = if pivot == 0 {
        // everything fell on the right: slide the cut down to the smallest value so
        // the point(s) equal to it move left, isolating at least one point there.
        #[cfg(feature = "tracing")]
        tracing::event!(tracing::Level::TRACE, dim, n = indices.len(), "sliding midpoint down: right side held every point");
        let mut min_val = cloud.point(indices[0])[dim];
        for &i in indices.iter() {
            let v = cloud.point(i)[dim];
            if v < min_val {
                min_val = v;
            }
        }
        pivot = partition_by_cut(cloud, indices, dim, min_val);
        min_val
    } else if pivot == indices.len() {
        // everything fell on the left: slide the cut up to the largest value so that
        // value's point(s) move right instead.
        #[cfg(feature = "tracing")]
        tracing::event!(tracing::Level::TRACE, dim, n = indices.len(), "sliding midpoint up: left side held every point");
        let mut max_val = cloud.point(indices[0])[dim];
        for &i in indices.iter() {
            let v = cloud.point(i)[dim];
            if v > max_val {
                max_val = v;
            }
        }
        pivot = partition_by_cut_exclusive(cloud, indices, dim, max_val);
        max_val
    } else {
        midpoint
    };

    if pivot == 0 || pivot == indices.len() {
        // every point coincides along every axis (fully degenerate, duplicate-point
        // cloud): no cut value can separate them, so fall back to an arbitrary
        // positional half-split purely to guarantee progress.
        let half = indices.len() / 2;
        return (dim, cut, half.max(1).min(indices.len() - 1));
    }

    (dim, cut, pivot)
}

/// Partitions `indices` into `[<= cut]` followed by `[> cut]`, returning the boundary.
fn partition_by_cut<A: Axis>(cloud: &Cloud<A>, indices: &mut [usize], dim: usize, cut: A) -> usize {
    let mut i = 0;
    let mut j = indices.len();
    while i < j {
        if cloud.point(indices[i])[dim] <= cut {
            i += 1;
        } else {
            j -= 1;
            indices.swap(i, j);
        }
    }
    i
}

/// Partitions `indices` into `[< cut]` followed by `[>= cut]`, returning the boundary.
/// Used when sliding the cut up to isolate the maximum value on the right.
fn partition_by_cut_exclusive<A: Axis>(
    cloud: &Cloud<A>,
    indices: &mut [usize],
    dim: usize,
    cut: A,
) -> usize {
    let mut i = 0;
    let mut j = indices.len();
    while i < j {
        if cloud.point(indices[i])[dim] < cut {
            i += 1;
        } else {
            j -= 1;
            indices.swap(i, j);
        }
    }
    i
}

/// Post-build sanity check, compiled out entirely in release builds: every point
/// index in `0..n` was placed at exactly one leaf, and every stored split axis is
/// within `0..dim`. Each tree's `new()` calls this once after building; a failure
/// here is a bug in that tree's `build`, never something caller input can trigger.
#[cfg(debug_assertions)]
pub(crate) fn debug_assert_build_invariants(
    dim: usize,
    n: usize,
    leaf_indices: impl Iterator<Item = usize>,
    split_dims: impl Iterator<Item = usize>,
) {
    let mut seen = vec![false; n];
    let mut placed = 0;
    for index in leaf_indices {
        debug_assert!(index < n, "leaf index {index} out of range for {n} points");
        debug_assert!(!seen[index], "builder placed index {index} more than once");
        seen[index] = true;
        placed += 1;
    }
    debug_assert_eq!(placed, n, "builder placed {placed} of {n} points");
    for split_dim in split_dims {
        debug_assert!(split_dim < dim, "split axis {split_dim} out of range for {dim} dimensions");
    }
}
