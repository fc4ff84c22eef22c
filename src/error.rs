//! Error types returned by construction and query operations.

use thiserror::Error;

/// Errors that can occur when building a searcher or running a query against one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The cloud supplied to a constructor had zero columns (no points).
    #[error("cloud must contain at least one point, got {0}")]
    EmptyCloud(usize),

    /// The cloud supplied to a constructor had zero rows (no dimensions).
    #[error("cloud must have at least one dimension, got {0}")]
    ZeroDimensional(usize),

    /// A query point's length did not match the cloud's dimensionality.
    #[error("query has {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        /// dimensionality the searcher was built with
        expected: usize,
        /// dimensionality of the supplied query point
        actual: usize,
    },

    /// `k` was zero, or exceeded the number of points in the cloud.
    #[error("k={k} is out of range for a cloud of {n} points")]
    KOutOfRange {
        /// requested neighbour count
        k: usize,
        /// number of points available in the cloud
        n: usize,
    },

    /// The approximation factor `eps` was negative.
    #[error("eps must be >= 0, got {0}")]
    NegativeEps(f64),

    /// The flags bit mask contained bits not recognised by [`crate::flags::SearchFlags`].
    #[error("unrecognised search flag bits: {0:#x}")]
    UnrecognisedFlags(u32),

    /// An internal invariant was violated. Indicates a bug in this crate, not a
    /// caller error; debug builds catch this earlier via `debug_assert!` and panic
    /// with the same message before this variant is ever constructed.
    #[error("internal invariant violated: {0}")]
    Invariant(&'static str),
}

impl Error {
    /// Checks an invariant that must always hold for correctly-built input: panics
    /// with `what` in debug builds (the same message this carries, were it
    /// returned), and in release builds returns `Err(Error::Invariant(what))`
    /// instead of continuing past a state this crate never expects to reach.
    pub(crate) fn check_invariant(ok: bool, what: &'static str) -> Result<()> {
        debug_assert!(ok, "{what}");
        if ok {
            Ok(())
        } else {
            Err(Error::Invariant(what))
        }
    }
}

/// Convenience alias for this crate's fallible return type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_invariant_passes_through_on_success() {
        assert_eq!(Error::check_invariant(true, "unreachable"), Ok(()));
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "something broke"))]
    fn check_invariant_reports_a_violation() {
        let result = Error::check_invariant(false, "something broke");
        // Only reached in release builds, where debug_assert! is a no-op.
        assert_eq!(result, Err(Error::Invariant("something broke")));
    }
}
