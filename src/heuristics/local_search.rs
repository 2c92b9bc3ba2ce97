//! Local search improvement for the TSP.
//!
//! Implements a full-neighborhood 2-opt: every pair of non-adjacent edges is
//! examined in one sweep, improving exchanges are applied as soon as they are
//! found, and sweeps repeat until one of them changes nothing.

use crate::error::Result;
use crate::heuristics::construction::{ConstructionHeuristic, NearestNeighborHeuristic};
use crate::instance::{Cost, TspInstance};
use crate::solution::Solution;

/// Trait for local search improvement methods
pub trait LocalSearch {
    fn improve(&self, instance: &TspInstance, solution: &mut Solution) -> bool;
    fn name(&self) -> &str;
}

/// 2-Opt Local Search
///
/// For positions `1 <= i < j < n` with `j - i >= 2`, edges `(t[i-1], t[i])`
/// and `(t[j], t[j+1])` are replaced by `(t[i-1], t[j])` and `(t[i], t[j+1])`
/// when that strictly shortens the tour.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoOptSearch;

impl TwoOptSearch {
    pub fn new() -> Self {
        TwoOptSearch
    }

    /// Improve `initial` (or a nearest neighbor tour from city 0) to a 2-opt local optimum.
    ///
    /// The input solution is left untouched; the result is a new value.
    pub fn solve(&self, instance: &TspInstance, initial: Option<&Solution>) -> Result<Solution> {
        let start = std::time::Instant::now();
        let mut solution = match initial {
            Some(sol) => Solution::from_tour(instance, sol.tour.clone(), self.name())?,
            None => NearestNeighborHeuristic::new().construct(instance)?,
        };

        let before = solution.cost;
        self.improve(instance, &mut solution);
        solution.algorithm = self.name().to_string();
        solution.computation_time = start.elapsed().as_secs_f64();

        log::debug!(
            "2-opt on '{}': {} -> {} in {} sweeps",
            instance.name,
            before,
            solution.cost,
            solution.iterations.unwrap_or(0)
        );
        Ok(solution)
    }

    /// Returns `(removed, added)` edge weight for reversing `tour[i..=j]`.
    ///
    /// On asymmetric instances the reversed segment's inner edges change
    /// direction, so they are included in both sides.
    fn exchange_cost(instance: &TspInstance, tour: &[usize], i: usize, j: usize) -> (Cost, Cost) {
        let n = tour.len();
        let a = tour[i - 1];
        let b = tour[i];
        let c = tour[j];
        let d = tour[(j + 1) % n];

        let mut removed = instance.distance(a, b) + instance.distance(c, d);
        let mut added = instance.distance(a, c) + instance.distance(b, d);

        if !instance.is_symmetric() {
            for k in i..j {
                removed += instance.distance(tour[k], tour[k + 1]);
                added += instance.distance(tour[k + 1], tour[k]);
            }
        }
        (removed, added)
    }

    /// Exhaustively check that no exchange strictly shortens `tour`
    pub fn is_two_opt_optimal(instance: &TspInstance, tour: &[usize]) -> bool {
        let n = tour.len();
        (1..n).all(|i| {
            (i + 2..n).all(|j| {
                let (removed, added) = Self::exchange_cost(instance, tour, i, j);
                added >= removed
            })
        })
    }
}

impl LocalSearch for TwoOptSearch {
    fn improve(&self, instance: &TspInstance, solution: &mut Solution) -> bool {
        let n = solution.tour.len();
        let mut sweeps = 0;
        let mut total_improved = false;

        if n >= 4 {
            let mut improved = true;
            while improved {
                improved = false;
                sweeps += 1;

                for i in 1..n - 1 {
                    for j in i + 2..n {
                        let (removed, added) = Self::exchange_cost(instance, &solution.tour, i, j);
                        if added < removed {
                            solution.apply_two_opt(i, j);
                            solution.cost = solution.cost - removed + added;
                            improved = true;
                            total_improved = true;
                        }
                    }
                }
            }
        }

        debug_assert_eq!(solution.cost, instance.tour_length(&solution.tour));
        solution.iterations = Some(sweeps);
        total_improved
    }

    fn name(&self) -> &str {
        "2-Opt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::tests::{four_city_instance, random_instance};

    /// Six cities on a line at positions 0..6
    fn line_instance() -> TspInstance {
        let matrix = (0..6u64)
            .map(|i| (0..6u64).map(|j| i.abs_diff(j)).collect())
            .collect();
        TspInstance::from_matrix("line", matrix).unwrap()
    }

    #[test]
    fn test_two_opt() {
        let instance = line_instance();
        let initial = Solution::from_tour(&instance, vec![0, 3, 2, 1, 4, 5], "test").unwrap();
        assert_eq!(initial.cost, 14);

        let improved = TwoOptSearch::new().solve(&instance, Some(&initial)).unwrap();
        assert_eq!(improved.tour, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(improved.cost, 10);
        assert!(improved.validate(&instance));

        // the caller's solution is not modified
        assert_eq!(initial.tour, vec![0, 3, 2, 1, 4, 5]);
        assert_eq!(initial.cost, 14);
    }

    #[test]
    fn test_two_opt_skips_segments_of_two() {
        // on four cities the only remaining pair reverses the whole tail, which changes nothing
        let instance = four_city_instance();
        let initial = Solution::from_tour(&instance, vec![0, 1, 2, 3], "test").unwrap();
        let sol = TwoOptSearch::new().solve(&instance, Some(&initial)).unwrap();
        assert_eq!(sol.cost, 95);
        assert!(TwoOptSearch::is_two_opt_optimal(&instance, &sol.tour));
    }

    #[test]
    fn test_two_opt_without_initial_uses_nearest_neighbor() {
        let instance = random_instance(25, 4);
        let nn = NearestNeighborHeuristic::new().construct(&instance).unwrap();
        let improved = TwoOptSearch::new().solve(&instance, None).unwrap();
        assert!(improved.cost <= nn.cost);
        assert_eq!(improved.tour[0], 0);
        assert!(improved.validate(&instance));
    }

    #[test]
    fn test_two_opt_reaches_local_optimum() {
        for seed in 0..5 {
            let instance = random_instance(30, seed);
            let sol = TwoOptSearch::new().solve(&instance, None).unwrap();
            assert!(TwoOptSearch::is_two_opt_optimal(&instance, &sol.tour));
        }
    }

    #[test]
    fn test_two_opt_idempotent() {
        let instance = random_instance(30, 8);
        let once = TwoOptSearch::new().solve(&instance, None).unwrap();
        let twice = TwoOptSearch::new().solve(&instance, Some(&once)).unwrap();
        assert_eq!(once.cost, twice.cost);
        assert_eq!(twice.iterations, Some(1));
    }

    #[test]
    fn test_two_opt_small_tours() {
        let instance = TspInstance::from_matrix("three", vec![vec![0, 1, 2], vec![1, 0, 3], vec![2, 3, 0]]).unwrap();
        let sol = TwoOptSearch::new().solve(&instance, None).unwrap();
        assert_eq!(sol.cost, 6);
        assert_eq!(sol.iterations, Some(0));
    }

    #[test]
    fn test_two_opt_keeps_cost_consistent_on_asymmetric_instances() {
        let instance = TspInstance::from_matrix(
            "asym",
            vec![
                vec![0, 1, 9, 4, 7],
                vec![8, 0, 2, 6, 3],
                vec![5, 9, 0, 1, 8],
                vec![2, 7, 4, 0, 1],
                vec![1, 3, 6, 9, 0],
            ],
        )
        .unwrap();
        let initial = Solution::from_tour(&instance, vec![0, 3, 1, 4, 2], "test").unwrap();
        let sol = TwoOptSearch::new().solve(&instance, Some(&initial)).unwrap();
        assert!(sol.cost <= initial.cost);
        assert!(sol.validate(&instance));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::instance::tests::random_instance;
    use proptest::prelude::*;

    proptest! {
        /// Property: 2-opt never makes a tour longer and its result is a permutation.
        #[test]
        fn prop_two_opt_monotone(seed in 0u64..5000, n in 1usize..25) {
            let instance = random_instance(n, seed);
            let nn = NearestNeighborHeuristic::new().construct(&instance).unwrap();
            let sol = TwoOptSearch::new().solve(&instance, Some(&nn)).unwrap();
            prop_assert!(sol.cost <= nn.cost);
            prop_assert!(sol.is_complete(&instance));
            prop_assert_eq!(sol.cost, instance.tour_length(&sol.tour));
        }
    }
}
