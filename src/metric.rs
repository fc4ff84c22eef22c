//! The squared-Euclidean distance metric used throughout the crate.
//!
//! Squared Euclidean is the only metric: no square roots, no alternative
//! metrics. The trait shape is kept distance-metric-style (rather than a single
//! free function) so the per-axis `dist1` used by the incremental-offset descent
//! has a natural home next to the full `dist`.

use crate::scalar::Axis;

/// A distance metric over D-dimensional points of scalar type `A`.
pub trait DistanceMetric<A> {
    /// Distance between two full points.
    fn dist(a: &[A], b: &[A]) -> A;

    /// Distance contributed by a single axis; used to extend or shrink a
    /// lower-bound distance incrementally while descending or backtracking
    /// through a tree.
    fn dist1(a: A, b: A) -> A;
}

/// Squared Euclidean distance: `sum((a_i - b_i)^2)`. Never takes a square root.
pub struct SquaredEuclidean;

impl<A: Axis> DistanceMetric<A> for SquaredEuclidean {
    #[inline]
    fn dist(a: &[A], b: &[A]) -> A {
        a.iter()
            .zip(b.iter())
            .map(|(&a_val, &b_val)| (a_val - b_val) * (a_val - b_val))
            .fold(A::zero(), std::ops::Add::add)
    }

    #[inline]
    fn dist1(a: A, b: A) -> A {
        (a - b) * (a - b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_identical_points() {
        assert_eq!(0f64, SquaredEuclidean::dist(&[0f64, 0f64], &[0f64, 0f64]));
    }

    #[test]
    fn matches_manual_computation() {
        assert_eq!(1f32, SquaredEuclidean::dist(&[0f32, 0f32], &[1f32, 0f32]));
        assert_eq!(2f32, SquaredEuclidean::dist(&[0f32, 0f32], &[1f32, 1f32]));
        assert_eq!(8f64, SquaredEuclidean::dist(&[0f64, 0f64], &[2f64, 2f64]));
    }

    #[test]
    fn dist1_matches_single_axis_dist() {
        assert_eq!(9f32, SquaredEuclidean::dist1(1f32, 4f32));
    }
}
