//! The immutable point-cloud view shared by every searcher.

use crate::error::Error;
use crate::scalar::Axis;

/// An immutable, borrowed view over a D-dimensional, N-point cloud stored column-major:
/// point `i`'s coordinates are contiguous, `data[i * dim .. i * dim + dim]`.
///
/// Column-major-per-point storage is what lets the cache-optimised leaf variant
/// (`UnbalancedImplicitOptimised`) dereference a point's coordinates as a single
/// contiguous run instead of striding through the buffer.
#[derive(Clone, Copy, Debug)]
pub struct Cloud<'a, A> {
    data: &'a [A],
    dim: usize,
    len: usize,
    min_bound: &'a [A],
    max_bound: &'a [A],
}

/// Owned bounding box plus the borrowed cloud it was computed from; `Cloud::new`
/// hands back a `Cloud` borrowing from bounds computed and stored by the caller's
/// searcher, so the searcher is the sole owner of the bounds' backing storage.
pub struct Bounds<A> {
    pub(crate) min: Vec<A>,
    pub(crate) max: Vec<A>,
}

impl<A: Axis> Bounds<A> {
    /// Computes the component-wise min/max over every point in `data` (dim-major chunks).
    pub fn compute(data: &[A], dim: usize) -> Self {
        let mut min = vec![A::infinity(); dim];
        let mut max = vec![A::neg_infinity(); dim];
        for point in data.chunks_exact(dim) {
            for d in 0..dim {
                if point[d] < min[d] {
                    min[d] = point[d];
                }
                if point[d] > max[d] {
                    max[d] = point[d];
                }
            }
        }
        Bounds { min, max }
    }
}

impl<'a, A: Axis> Cloud<'a, A> {
    /// Builds a cloud view over `data` (`dim`-major point chunks) together with
    /// precomputed `bounds`. Fails if `data` is empty or `dim` is zero.
    pub fn new(data: &'a [A], dim: usize, bounds: &'a Bounds<A>) -> Result<Self, Error> {
        if dim == 0 {
            return Err(Error::ZeroDimensional(0));
        }
        if data.is_empty() || data.len() % dim != 0 {
            return Err(Error::EmptyCloud(0));
        }
        let len = data.len() / dim;
        if len == 0 {
            return Err(Error::EmptyCloud(0));
        }
        Ok(Cloud {
            data,
            dim,
            len,
            min_bound: &bounds.min,
            max_bound: &bounds.max,
        })
    }

    /// Number of dimensions each point has.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of points in the cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the cloud has zero points (never true for a successfully constructed `Cloud`).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Coordinates of point `i`.
    #[inline]
    pub fn point(&self, i: usize) -> &'a [A] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Per-dimension minimum over every point in the cloud.
    #[inline]
    pub fn min_bound(&self) -> &'a [A] {
        self.min_bound
    }

    /// Per-dimension maximum over every point in the cloud.
    #[inline]
    pub fn max_bound(&self) -> &'a [A] {
        self.max_bound
    }

    /// Iterator over `(index, point)` pairs, in cloud order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &'a [A])> {
        let dim = self.dim;
        self.data.chunks_exact(dim).enumerate()
    }
}
