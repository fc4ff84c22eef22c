//! The common search interface implemented by every searcher (brute force and
//! each k-d tree variant).

use crate::error::Error;
use crate::flags::SearchFlags;
use crate::scalar::Axis;
use crate::stats::Statistics;

/// Capability set shared by the brute-force searcher and every k-d tree variant.
///
/// Exposed as a trait with generic (monomorphised) methods rather than a trait
/// object so the query hot path never pays for virtual dispatch; callers that need
/// to pick a variant at runtime do so via an enum over the concrete types, not
/// `dyn KnnSearch`.
pub trait KnnSearch<A: Axis> {
    /// Returns the indices of the `k` cloud points nearest `query`, honouring
    /// `flags` (a raw [`SearchFlags`] bit mask) and the `eps` approximation factor
    /// (`eps = 0` is exact search).
    ///
    /// Fails if `query.len()` doesn't match the cloud's dimensionality, `k` is zero
    /// or exceeds the cloud size, `eps` is negative, or `flags` contains bits not
    /// recognised by [`SearchFlags`]: a stray bit is a caller error, not something
    /// silently ignored.
    fn knn(&self, query: &[A], k: usize, eps: A, flags: u32) -> Result<Vec<usize>, Error>;

    /// Batched form of [`KnnSearch::knn`]: `queries` holds `m` D-dimensional query
    /// points laid out the same way as a cloud (`m * dim` scalars, point-major).
    /// Returns `k * m` indices, one block of `k` per query column in order.
    ///
    /// The default implementation simply calls [`KnnSearch::knn`] once per query;
    /// variants that can amortise shared work across the batch may override it.
    fn knn_m(
        &self,
        queries: &[A],
        dim: usize,
        k: usize,
        eps: A,
        flags: u32,
    ) -> Result<Vec<usize>, Error> {
        if dim == 0 || queries.len() % dim != 0 {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: queries.len(),
            });
        }
        let mut out = Vec::with_capacity((queries.len() / dim) * k);
        for query in queries.chunks_exact(dim) {
            out.extend(self.knn(query, k, eps, flags)?);
        }
        Ok(out)
    }

    /// A snapshot of this searcher's visit counters.
    fn statistics(&self) -> Statistics;
}

/// Validates the common query preconditions shared by every searcher
/// implementation, so each variant's `knn` starts with the same checks in the
/// same order rather than duplicating (and risking divergent) validation logic.
pub(crate) fn validate_query<A: Axis>(
    query: &[A],
    dim: usize,
    k: usize,
    n: usize,
    eps: A,
    raw_flags: u32,
) -> Result<SearchFlags, Error> {
    if query.len() != dim {
        return Err(Error::DimensionMismatch {
            expected: dim,
            actual: query.len(),
        });
    }
    if k == 0 || k > n {
        return Err(Error::KOutOfRange { k, n });
    }
    if eps < A::zero() {
        return Err(Error::NegativeEps(eps.to_f64().unwrap_or(f64::NAN)));
    }
    // Every constructor rejects an empty cloud, so `n` reaching zero here would mean
    // a tree outlived or never saw a valid build; not something a caller can trigger.
    Error::check_invariant(n > 0, "query issued against a zero-length cloud")?;
    SearchFlags::from_bits(raw_flags).ok_or(Error::UnrecognisedFlags(raw_flags))
}
