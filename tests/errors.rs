//! Construction- and query-error paths: one dedicated test per `Error` variant
//! that a caller can actually trigger.

mod common;

use kindred::brute_force::BruteForce;
use kindred::cloud::Bounds;
use kindred::error::Error;
use kindred::search::KnnSearch;
use kindred::tree::UnbalancedImplicitStack;

#[test]
fn construction_rejects_empty_cloud() {
    let data: [f64; 0] = [];
    let bounds = Bounds::compute(&data, 2);
    let err = UnbalancedImplicitStack::new(&data, 2, &bounds).unwrap_err();
    assert!(matches!(err, Error::EmptyCloud(_)));
}

#[test]
fn construction_rejects_zero_dimensional_cloud() {
    let data: [f64; 0] = [];
    let bounds = Bounds::compute(&data, 0);
    let err = UnbalancedImplicitStack::new(&data, 0, &bounds).unwrap_err();
    assert!(matches!(err, Error::ZeroDimensional(_)));
}

#[test]
fn query_rejects_wrong_length_point() {
    let (data, dim) = common::uniform_cube(20, 3, 1);
    let bounds = Bounds::compute(&data, dim);
    let tree = UnbalancedImplicitStack::new(&data, dim, &bounds).unwrap();
    let err = tree.knn(&[0.0, 0.0], 1, 0.0, 0).unwrap_err();
    assert_eq!(
        err,
        Error::DimensionMismatch {
            expected: 3,
            actual: 2
        }
    );
}

#[test]
fn query_rejects_zero_k() {
    let (data, dim) = common::uniform_cube(20, 3, 1);
    let bounds = Bounds::compute(&data, dim);
    let tree = UnbalancedImplicitStack::new(&data, dim, &bounds).unwrap();
    let err = tree.knn(&[0.0, 0.0, 0.0], 0, 0.0, 0).unwrap_err();
    assert_eq!(err, Error::KOutOfRange { k: 0, n: 20 });
}

#[test]
fn query_rejects_k_larger_than_cloud() {
    let (data, dim) = common::uniform_cube(20, 3, 1);
    let bounds = Bounds::compute(&data, dim);
    let tree = UnbalancedImplicitStack::new(&data, dim, &bounds).unwrap();
    let err = tree.knn(&[0.0, 0.0, 0.0], 21, 0.0, 0).unwrap_err();
    assert_eq!(err, Error::KOutOfRange { k: 21, n: 20 });
}

#[test]
fn query_rejects_negative_eps() {
    let (data, dim) = common::uniform_cube(20, 3, 1);
    let bounds = Bounds::compute(&data, dim);
    let tree = UnbalancedImplicitStack::new(&data, dim, &bounds).unwrap();
    let err = tree.knn(&[0.0, 0.0, 0.0], 1, -0.1, 0).unwrap_err();
    assert_eq!(err, Error::NegativeEps(-0.1));
}

#[test]
fn query_rejects_unrecognised_flag_bits() {
    let (data, dim) = common::uniform_cube(20, 3, 1);
    let bounds = Bounds::compute(&data, dim);
    let tree = UnbalancedImplicitStack::new(&data, dim, &bounds).unwrap();
    let err = tree.knn(&[0.0, 0.0, 0.0], 1, 0.0, 0b1000).unwrap_err();
    assert_eq!(err, Error::UnrecognisedFlags(0b1000));
}

#[test]
fn failed_query_does_not_advance_visit_count() {
    let (data, dim) = common::uniform_cube(20, 3, 1);
    let bounds = Bounds::compute(&data, dim);
    let bf = BruteForce::new(&data, dim, &bounds).unwrap();
    let before = bf.statistics().total_visit_count;
    assert!(bf.knn(&[0.0, 0.0, 0.0], 100, 0.0, 0).is_err());
    assert_eq!(bf.statistics().total_visit_count, before);
}
