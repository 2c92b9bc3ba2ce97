//! TSP Solver Library
//!
//! Solvers for the symmetric Traveling Salesman Problem on integer distance
//! matrices.
//!
//! # Features
//!
//! - Nearest neighbor construction and a randomized greedy variant
//! - 2-opt local search to a local optimum
//! - GRASP metaheuristic (randomized construction + 2-opt restarts)
//! - Exact depth-first branch-and-bound with an MST lower bound and a time limit
//! - Benchmarking, alpha tuning and method comparison tools
//!
//! # Example
//!
//! ```no_run
//! use tsp_solver::instance::TspInstance;
//! use tsp_solver::heuristics::construction::{ConstructionHeuristic, NearestNeighborHeuristic};
//! use tsp_solver::heuristics::local_search::TwoOptSearch;
//! use tsp_solver::exact::{BranchAndBoundConfig, BranchAndBoundSolver};
//!
//! // Load instance
//! let instance = TspInstance::from_file("instance.in").unwrap();
//!
//! // Construct and improve
//! let initial = NearestNeighborHeuristic::new().construct(&instance).unwrap();
//! let improved = TwoOptSearch::new().solve(&instance, Some(&initial)).unwrap();
//!
//! // Prove optimality on small instances
//! let solver = BranchAndBoundSolver::new(BranchAndBoundConfig { time_limit: 60.0 }).unwrap();
//! let exact = solver.solve(&instance).unwrap();
//!
//! println!("2-opt: {}, exact: {} ({})", improved.cost, exact.solution.cost, exact.status);
//! ```

pub mod error;
pub mod instance;
pub mod solution;
pub mod heuristics;
pub mod exact;
pub mod benchmark;

pub use error::{Result, SolverError};
pub use instance::TspInstance;
pub use solution::Solution;
