//! Heuristics module for the TSP.
//!
//! This module exports the construction heuristics, the 2-opt improvement
//! and the GRASP metaheuristic built on both.

pub mod construction;
pub mod local_search;
pub mod grasp;

pub use construction::*;
pub use local_search::*;
pub use grasp::*;
