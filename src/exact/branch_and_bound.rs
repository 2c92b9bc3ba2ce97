//! Depth-first branch-and-bound with an MST lower bound.
//!
//! Tours are rooted at city 0. A partial path `0 -> ... -> current` with cost
//! `c` is bounded below by
//!
//! ```text
//! c + mst(unvisited) + min_u d(current, u) + min_u d(u, 0)
//! ```
//!
//! and pruned when that bound reaches the incumbent. The incumbent starts
//! from the nearest neighbor tour, so a result is always available even when
//! the search is cut off by its deadline.

use crate::error::{Result, SolverError};
use crate::exact::mst::mst_cost;
use crate::heuristics::construction::{ConstructionHeuristic, NearestNeighborHeuristic};
use crate::instance::{Cost, TspInstance};
use crate::solution::Solution;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const ROOT: usize = 0;

/// Branch-and-bound configuration
#[derive(Debug, Clone)]
pub struct BranchAndBoundConfig {
    /// Wall-clock budget in seconds
    pub time_limit: f64,
}

impl Default for BranchAndBoundConfig {
    fn default() -> Self {
        BranchAndBoundConfig { time_limit: 300.0 }
    }
}

impl BranchAndBoundConfig {
    pub fn validate(&self) -> Result<()> {
        if self.time_limit.is_nan() || self.time_limit <= 0.0 {
            return Err(SolverError::empty_result(format!(
                "time limit must be positive, got {}",
                self.time_limit
            )));
        }
        Ok(())
    }
}

/// How the search ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStatus {
    /// The tree was exhausted; the tour is a proven optimum
    Optimal,
    /// The deadline passed; the tour is the best found so far
    TimeLimit,
}

impl std::fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchStatus::Optimal => write!(f, "optimal"),
            SearchStatus::TimeLimit => write!(f, "time limit"),
        }
    }
}

/// Result of an exact solve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExactResult {
    pub solution: Solution,
    pub status: SearchStatus,
    /// Cost of the constructive starting incumbent
    pub initial_cost: Cost,
    pub nodes_explored: u64,
    pub nodes_pruned: u64,
    /// Seconds spent searching
    pub elapsed: f64,
}

impl ExactResult {
    pub fn is_optimal(&self) -> bool {
        self.status == SearchStatus::Optimal
    }
}

/// Mutable state of a single search. Built fresh for every solve.
struct SearchContext<'a> {
    instance: &'a TspInstance,
    visited: Vec<bool>,
    path: Vec<usize>,
    best_tour: Vec<usize>,
    upper_bound: Cost,
    nodes_explored: u64,
    nodes_pruned: u64,
    timed_out: bool,
}

impl<'a> SearchContext<'a> {
    fn new(instance: &'a TspInstance, incumbent: &Solution) -> Self {
        let n = instance.dimension;
        let mut visited = vec![false; n];
        visited[ROOT] = true;
        let mut path = Vec::with_capacity(n);
        path.push(ROOT);

        SearchContext {
            instance,
            visited,
            path,
            best_tour: incumbent.tour.clone(),
            upper_bound: incumbent.cost,
            nodes_explored: 0,
            nodes_pruned: 0,
            timed_out: false,
        }
    }

    fn lower_bound(&self, current: usize, cost: Cost) -> Cost {
        let unvisited: Vec<usize> = (0..self.instance.dimension)
            .filter(|&c| !self.visited[c])
            .collect();

        if unvisited.is_empty() {
            return cost + self.instance.distance(current, ROOT);
        }

        let enter = unvisited
            .iter()
            .map(|&u| self.instance.distance(current, u))
            .min()
            .unwrap_or(0);
        let leave = unvisited
            .iter()
            .map(|&u| self.instance.distance(u, ROOT))
            .min()
            .unwrap_or(0);

        cost + mst_cost(self.instance, &unvisited) + enter + leave
    }

    fn search(&mut self, current: usize, cost: Cost, deadline: Option<Instant>) {
        if self.timed_out {
            return;
        }
        // a deadline that is merely reached already counts as expired
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                self.timed_out = true;
                return;
            }
        }
        self.nodes_explored += 1;

        if self.lower_bound(current, cost) >= self.upper_bound {
            self.nodes_pruned += 1;
            return;
        }

        let n = self.instance.dimension;
        if self.path.len() == n {
            let total = cost + self.instance.distance(current, ROOT);
            if total < self.upper_bound {
                log::debug!(
                    "branch-and-bound on '{}': new incumbent {} after {} nodes",
                    self.instance.name,
                    total,
                    self.nodes_explored
                );
                self.upper_bound = total;
                self.best_tour.clone_from(&self.path);
            }
            return;
        }

        let mut children: Vec<(Cost, usize)> = (0..n)
            .filter(|&c| !self.visited[c])
            .map(|c| (self.instance.distance(current, c), c))
            .collect();
        children.sort_unstable();

        for (edge, city) in children {
            if self.timed_out {
                return;
            }
            if cost + edge >= self.upper_bound {
                self.nodes_pruned += 1;
                continue;
            }

            self.visited[city] = true;
            self.path.push(city);
            self.search(city, cost + edge, deadline);
            self.path.pop();
            self.visited[city] = false;
        }
    }
}

/// Exact TSP solver. Holds only configuration, so one value can solve any
/// number of instances, sequentially or from several threads.
pub struct BranchAndBoundSolver {
    config: BranchAndBoundConfig,
}

impl BranchAndBoundSolver {
    pub fn new(config: BranchAndBoundConfig) -> Result<Self> {
        config.validate()?;
        Ok(BranchAndBoundSolver { config })
    }

    pub fn config(&self) -> &BranchAndBoundConfig {
        &self.config
    }

    /// Solve with a deadline `time_limit` seconds from now
    pub fn solve(&self, instance: &TspInstance) -> Result<ExactResult> {
        let deadline = Duration::try_from_secs_f64(self.config.time_limit)
            .ok()
            .and_then(|limit| Instant::now().checked_add(limit));
        self.solve_until(instance, deadline)
    }

    /// Solve until `deadline`, or to completion when it is `None`
    ///
    /// The deadline is checked on entry to every search node; the search
    /// stops at the first node entered once `deadline` is reached.
    pub fn solve_until(&self, instance: &TspInstance, deadline: Option<Instant>) -> Result<ExactResult> {
        let start = Instant::now();
        let incumbent = NearestNeighborHeuristic::new().construct(instance)?;
        let initial_cost = incumbent.cost;

        let mut ctx = SearchContext::new(instance, &incumbent);
        ctx.search(ROOT, 0, deadline);

        let status = if ctx.timed_out {
            SearchStatus::TimeLimit
        } else {
            SearchStatus::Optimal
        };
        let elapsed = start.elapsed().as_secs_f64();

        let mut solution = Solution::from_tour(instance, ctx.best_tour, self.name())?;
        solution.computation_time = elapsed;

        match status {
            SearchStatus::Optimal => log::info!(
                "branch-and-bound on '{}': optimum {} ({} nodes, {} pruned, {:.3}s)",
                instance.name,
                solution.cost,
                ctx.nodes_explored,
                ctx.nodes_pruned,
                elapsed
            ),
            SearchStatus::TimeLimit => log::warn!(
                "branch-and-bound on '{}' hit the time limit; best {} is not proven optimal ({} nodes)",
                instance.name,
                solution.cost,
                ctx.nodes_explored
            ),
        }

        Ok(ExactResult {
            solution,
            status,
            initial_cost,
            nodes_explored: ctx.nodes_explored,
            nodes_pruned: ctx.nodes_pruned,
            elapsed,
        })
    }

    pub fn name(&self) -> &str {
        "BranchAndBound"
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::heuristics::local_search::TwoOptSearch;
    use crate::instance::tests::random_instance;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Property: a completed search is never beaten by 2-opt and never worse than its start.
        #[test]
        fn prop_exact_dominates_heuristics(seed in 0u64..5000, n in 1usize..9) {
            let instance = random_instance(n, seed);
            let solver = BranchAndBoundSolver::new(BranchAndBoundConfig::default()).unwrap();
            let result = solver.solve(&instance).unwrap();
            let two_opt = TwoOptSearch::new().solve(&instance, None).unwrap();

            prop_assert!(result.is_optimal());
            prop_assert!(result.solution.validate(&instance));
            prop_assert!(result.solution.cost <= result.initial_cost);
            prop_assert!(result.solution.cost <= two_opt.cost);
        }
    }
}
