//! Data-driven property tests, generated with `rand` and run against every
//! searcher variant plus the brute-force oracle.

mod common;

use kindred::brute_force::BruteForce;
use kindred::cloud::Bounds;
use kindred::flags::SearchFlags;
use kindred::metric::{DistanceMetric, SquaredEuclidean};
use kindred::search::KnnSearch;
use rand::{rngs::StdRng, Rng, SeedableRng};

#[test]
fn scenario_4_uniform_cube_matches_brute_force() {
    let (data, dim) = common::uniform_cube(1000, 3, 1);
    let bounds = Bounds::compute(&data, dim);
    let bf = BruteForce::new(&data, dim, &bounds).unwrap();

    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..10 {
        let q: Vec<f64> = (0..dim).map(|_| rng.gen_range(0.0..1.0)).collect();
        let mut expected = bf.knn(&q, 10, 0.0, 0).unwrap();
        expected.sort_unstable();

        for (name, tree) in common::all_variants(&data, dim, &bounds) {
            let mut got = tree.knn(&q, 10, 0.0, 0).unwrap();
            got.sort_unstable();
            assert_eq!(got, expected, "variant {name} disagreed on query {q:?}");
        }
    }
}

#[test]
fn scenario_5_degenerate_line_distribution_terminates_and_matches() {
    let (data, dim) = common::degenerate_line(1000, 3);
    let bounds = Bounds::compute(&data, dim);
    let bf = BruteForce::new(&data, dim, &bounds).unwrap();

    let q = [0.3, 0.5, 0.5];
    let mut expected = bf.knn(&q, 10, 0.0, 0).unwrap();
    expected.sort_unstable();

    for (name, tree) in common::all_variants(&data, dim, &bounds) {
        let mut got = tree.knn(&q, 10, 0.0, 0).unwrap();
        got.sort_unstable();
        assert_eq!(got, expected, "variant {name} disagreed on degenerate cloud");
    }
}

#[test]
fn scenario_6_approximate_search_bound_and_visit_savings() {
    let (data, dim) = common::uniform_cube(10_000, 7, 3);
    let bounds = Bounds::compute(&data, dim);
    let bf = BruteForce::new(&data, dim, &bounds).unwrap();

    let mut rng = StdRng::seed_from_u64(4);
    let q: Vec<f64> = (0..dim).map(|_| rng.gen_range(0.0..1.0)).collect();

    let exact = bf.knn(&q, 5, 0.0, SearchFlags::SORT_RESULTS.bits()).unwrap();
    let exact_kth_dist = SquaredEuclidean::dist(&q, &data[exact[4] * dim..exact[4] * dim + dim]);
    let bf_visits = bf.statistics().last_query_visit_count;

    let eps = 0.5;
    for (name, tree) in common::all_variants(&data, dim, &bounds) {
        let approx = tree.knn(&q, 5, eps, SearchFlags::SORT_RESULTS.bits()).unwrap();
        for &i in &approx {
            let d = SquaredEuclidean::dist(&q, &data[i * dim..i * dim + dim]);
            assert!(
                d <= 2.25 * exact_kth_dist + 1e-9,
                "variant {name} returned a neighbour outside the (1+eps)^2 bound"
            );
        }
        let visits = tree.statistics().last_query_visit_count;
        assert!(
            visits < bf_visits,
            "variant {name} visited {visits} nodes, not fewer than brute force's {bf_visits}"
        );
    }
}

#[test]
fn clustered_blob_distribution_matches_brute_force() {
    let (data, dim) = common::clustered_blobs(600, 3, 5, 8);
    let bounds = Bounds::compute(&data, dim);
    let bf = BruteForce::new(&data, dim, &bounds).unwrap();

    let mut rng = StdRng::seed_from_u64(9);
    for _ in 0..10 {
        let q: Vec<f64> = (0..dim).map(|_| rng.gen_range(-5.0..5.0)).collect();
        let mut expected = bf.knn(&q, 7, 0.0, 0).unwrap();
        expected.sort_unstable();

        for (name, tree) in common::all_variants(&data, dim, &bounds) {
            let mut got = tree.knn(&q, 7, 0.0, 0).unwrap();
            got.sort_unstable();
            assert_eq!(got, expected, "variant {name} disagreed on clustered cloud");
        }
    }
}

#[test]
fn visit_counters_are_monotone_and_consistent() {
    let (data, dim) = common::uniform_cube(500, 4, 5);
    let bounds = Bounds::compute(&data, dim);
    for (name, tree) in common::all_variants(&data, dim, &bounds) {
        let before = tree.statistics().total_visit_count;
        tree.knn(&[0.5, 0.5, 0.5, 0.5], 5, 0.0, 0).unwrap();
        let after_one = tree.statistics();
        assert_eq!(
            after_one.total_visit_count,
            before + after_one.last_query_visit_count,
            "variant {name} broke total = before + last"
        );

        tree.knn(&[0.1, 0.9, 0.2, 0.8], 5, 0.0, 0).unwrap();
        let after_two = tree.statistics();
        assert!(
            after_two.total_visit_count >= after_one.total_visit_count,
            "variant {name} total visit count went backwards"
        );
    }
}
