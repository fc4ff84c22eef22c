//! Shared fixtures for the integration test suite: synthetic clouds and a helper
//! that builds every searcher variant over the same cloud so a single property
//! check can run against all of them in a loop.

use kindred::cloud::Bounds;
use kindred::search::KnnSearch;
use kindred::tree::{
    BalancedLeavesStack, BalancedNodesPq, BalancedNodesStack, UnbalancedExplicitStack,
    UnbalancedImplicitOptimised, UnbalancedImplicitStack,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

#[allow(dead_code)]
pub fn uniform_cube(n: usize, dim: usize, seed: u64) -> (Vec<f64>, usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let data: Vec<f64> = (0..n * dim).map(|_| rng.gen_range(0.0..1.0)).collect();
    (data, dim)
}

#[allow(dead_code)]
pub fn degenerate_line(n: usize, seed: u64) -> (Vec<f64>, usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let data: Vec<f64> = (0..n)
        .flat_map(|_| [rng.gen_range(0.0..1.0), 0.5, 0.5])
        .collect();
    (data, 3)
}

/// Several Gaussian blobs rather than a uniform fill, so the balanced variants' and
/// the sliding-midpoint builders' median/spread choices see a skewed, clustered
/// distribution instead of only ever the uniform cube.
#[allow(dead_code)]
pub fn clustered_blobs(n: usize, dim: usize, blobs: usize, seed: u64) -> (Vec<f64>, usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let centres: Vec<Vec<f64>> = (0..blobs)
        .map(|_| (0..dim).map(|_| rng.gen_range(-5.0..5.0)).collect())
        .collect();
    let spread = Normal::new(0.0, 0.3).unwrap();
    let data: Vec<f64> = (0..n)
        .flat_map(|i| {
            let centre = &centres[i % blobs];
            centre.iter().map(|&c| c + spread.sample(&mut rng)).collect::<Vec<_>>()
        })
        .collect();
    (data, dim)
}

/// Every searcher variant, built over the same cloud, named for failure messages.
#[allow(dead_code)]
pub fn all_variants<'a>(
    data: &'a [f64],
    dim: usize,
    bounds: &'a Bounds<f64>,
) -> Vec<(&'static str, Box<dyn KnnSearch<f64> + 'a>)> {
    vec![
        (
            "balanced_nodes_pq",
            Box::new(BalancedNodesPq::new(data, dim, bounds).unwrap()) as Box<dyn KnnSearch<f64>>,
        ),
        (
            "balanced_nodes_stack",
            Box::new(BalancedNodesStack::new(data, dim, bounds).unwrap()),
        ),
        (
            "balanced_leaves_stack",
            Box::new(BalancedLeavesStack::new(data, dim, bounds, true).unwrap()),
        ),
        (
            "unbalanced_implicit",
            Box::new(UnbalancedImplicitStack::new(data, dim, bounds).unwrap()),
        ),
        (
            "unbalanced_implicit_opt",
            Box::new(UnbalancedImplicitOptimised::new(data, dim, bounds).unwrap()),
        ),
        (
            "unbalanced_explicit",
            Box::new(UnbalancedExplicitStack::new(data, dim, bounds).unwrap()),
        ),
    ]
}
