//! The five k-d tree variants, each trading off balance, node payload, and bound
//! representation differently. All share the [`crate::search::KnnSearch`] interface
//! and the build primitives in [`crate::builder`].

pub mod balanced_leaves;
pub mod balanced_nodes;
pub mod unbalanced_explicit;
pub mod unbalanced_implicit;
pub mod unbalanced_implicit_opt;

pub use balanced_leaves::BalancedLeavesStack;
pub use balanced_nodes::{BalancedNodesPq, BalancedNodesStack};
pub use unbalanced_explicit::UnbalancedExplicitStack;
pub use unbalanced_implicit::UnbalancedImplicitStack;
pub use unbalanced_implicit_opt::UnbalancedImplicitOptimised;
