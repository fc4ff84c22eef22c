//! Per-searcher visit-count statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// A snapshot of a searcher's visit counters, returned by `statistics()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Statistics {
    /// Node/leaf visits performed by the most recently completed query.
    pub last_query_visit_count: u64,
    /// Cumulative node/leaf visits across every completed query.
    pub total_visit_count: u64,
}

/// The atomic counters backing a searcher's [`Statistics`].
///
/// Both counters are updated with `Relaxed` ordering: callers only need them to be
/// safe to read concurrently with in-flight queries, not to observe
/// `last_query_visit_count` and `total_visit_count` as a consistent pair, so there
/// is nothing for a stronger ordering to buy us here.
#[derive(Debug, Default)]
pub struct AtomicStats {
    last_query_visit_count: AtomicU64,
    total_visit_count: AtomicU64,
}

impl AtomicStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a query visited `count` nodes/leaves. `last_query_visit_count`
    /// is replaced (last-writer-wins across concurrent queries); `total_visit_count`
    /// accumulates.
    pub fn record_query(&self, count: u64) {
        self.last_query_visit_count.store(count, Ordering::Relaxed);
        self.total_visit_count.fetch_add(count, Ordering::Relaxed);
    }

    /// Takes a consistent-enough snapshot of both counters for external reporting.
    pub fn snapshot(&self) -> Statistics {
        Statistics {
            last_query_visit_count: self.last_query_visit_count.load(Ordering::Relaxed),
            total_visit_count: self.total_visit_count.load(Ordering::Relaxed),
        }
    }
}
