//! Exact solvers.

pub mod branch_and_bound;
pub mod mst;

pub use branch_and_bound::{BranchAndBoundConfig, BranchAndBoundSolver, ExactResult, SearchStatus};
