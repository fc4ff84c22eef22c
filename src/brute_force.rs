//! Linear-scan brute-force searcher: the correctness oracle every tree variant is
//! tested against.

use crate::cloud::{Bounds, Cloud};
use crate::error::Error;
use crate::flags::SearchFlags;
use crate::heap::BoundedHeap;
use crate::metric::{DistanceMetric, SquaredEuclidean};
use crate::scalar::Axis;
use crate::search::{validate_query, KnnSearch};
use crate::stats::{AtomicStats, Statistics};

/// Searches a cloud by scanning every point once per query. Holds no index beyond
/// the cloud itself, so construction is instant and memory overhead is zero; query
/// cost is `O(n)` regardless of `k` or `eps`.
pub struct BruteForce<'a, A> {
    cloud: Cloud<'a, A>,
    stats: AtomicStats,
}

impl<'a, A: Axis> BruteForce<'a, A> {
    /// Builds a brute-force searcher over `data` (`dim`-major point chunks).
    pub fn new(data: &'a [A], dim: usize, bounds: &'a Bounds<A>) -> Result<Self, Error> {
        let cloud = Cloud::new(data, dim, bounds)?;
        Ok(BruteForce {
            cloud,
            stats: AtomicStats::new(),
        })
    }
}

impl<'a, A: Axis> KnnSearch<A> for BruteForce<'a, A> {
    fn knn(&self, query: &[A], k: usize, eps: A, flags: u32) -> Result<Vec<usize>, Error> {
        let flags = validate_query(query, self.cloud.dim(), k, self.cloud.len(), eps, flags)?;
        let allow_self_match = flags.contains(SearchFlags::ALLOW_SELF_MATCH);

        let mut heap: BoundedHeap<A> = BoundedHeap::new(k);
        let mut visited = 0u64;
        for (i, point) in self.cloud.iter() {
            visited += 1;
            let d = SquaredEuclidean::dist(query, point);
            if d == A::zero() && !allow_self_match {
                continue;
            }
            heap.try_insert(d, i);
        }
        self.stats.record_query(visited);

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
