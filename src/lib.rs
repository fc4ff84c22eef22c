#![warn(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::private_intra_doc_links)]
#![doc(html_root_url = "https://docs.rs/kindred")]
#![doc(issue_tracker_base_url = "https://github.com/kindred-rs/kindred/issues/")]

//! # Kindred
//!
//! Exact and approximate k-nearest-neighbour search over a fixed point cloud in
//! low- to moderate-dimensional Euclidean space.
//!
//! A client supplies an immutable set of `N` points in `D` dimensions, builds an
//! index once with one of the [`tree`] variants (or the [`brute_force`] oracle),
//! and thereafter answers `knn` queries of the form "the `k` cloud indices
//! closest to `q`, optionally within an `eps`-approximation factor".
//!
//! ## Choosing a searcher
//!
//! All searchers share the [`search::KnnSearch`] trait. [`brute_force::BruteForce`]
//! is the correctness oracle; the five k-d tree variants in [`tree`] trade off
//! balance, where points are stored, and how per-node cell bounds are represented:
//!
//! - [`tree::BalancedNodesPq`] / [`tree::BalancedNodesStack`]: balanced, points
//!   live in internal nodes, implicit binary-heap child layout.
//! - [`tree::BalancedLeavesStack`]: balanced, points live only in leaves.
//! - [`tree::UnbalancedImplicitStack`] / [`tree::UnbalancedImplicitOptimised`]:
//!   unbalanced sliding-midpoint build, cell bounds re-derived during descent.
//! - [`tree::UnbalancedExplicitStack`]: unbalanced sliding-midpoint build, cell
//!   bounds stored per node.
//!
//! ## Usage
//!
//! ```rust
//! use kindred::cloud::Bounds;
//! use kindred::flags::SearchFlags;
//! use kindred::search::KnnSearch;
//! use kindred::tree::UnbalancedImplicitStack;
//!
//! // 5 points in 2 dimensions, point-major: point i's coordinates are contiguous.
//! let data = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0];
//! let bounds = Bounds::compute(&data, 2);
//! let tree = UnbalancedImplicitStack::new(&data, 2, &bounds).unwrap();
//!
//! let nearest = tree.knn(&[0.1, 0.1], 1, 0.0, 0).unwrap();
//! assert_eq!(nearest, vec![0]);
//!
//! let three = tree
//!     .knn(&[0.0, 0.0], 3, 0.0, SearchFlags::SORT_RESULTS.bits())
//!     .unwrap();
//! assert_eq!(three.len(), 3);
//! assert!(!three.contains(&0)); // self-match excluded by default
//! ```
//!
//! ## Optional features
//!
//! * `tracing` (default-on): structured diagnostics at construction time via the
//!   [`tracing`](https://docs.rs/tracing) crate; off the query hot path.

pub mod brute_force;
pub mod builder;
pub mod cloud;
pub mod error;
pub mod flags;
pub mod heap;
pub mod metric;
pub mod scalar;
pub mod search;
pub mod stats;
pub mod tree;

pub use error::{Error, Result};
pub use flags::SearchFlags;
pub use search::KnnSearch;
