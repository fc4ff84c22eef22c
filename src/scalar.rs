//! The scalar-type trait shared by every searcher and tree variant.

use num_traits::Float;
use std::fmt::Debug;

/// Trait bounding the coordinate/distance type a cloud, tree, or heap is generic over.
///
/// Implemented for `f32` and `f64`. Beyond plain [`Float`], the tree builders and the
/// incremental-offset search trick need a couple of named constants and helpers, so
/// those are pulled in here rather than scattered as `Float` method calls at every
/// call site.
pub trait Axis: Float + Default + Debug + Copy + Sync + Send {
    /// squared distance lower bound one obtains by updating a single dimension's
    /// contribution to an incremental offset vector: `old_total - old_component_sq + new_component_sq`.
    #[inline]
    fn rd_update(old_rd: Self, old_off: Self, new_off: Self) -> Self {
        old_rd - old_off * old_off + new_off * new_off
    }
}

impl<T: Float + Default + Debug + Copy + Sync + Send> Axis for T {}
