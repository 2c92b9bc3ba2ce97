//! Solution representation and manipulation for the TSP.
//!
//! A solution is a closed tour over every city together with its total cost.

use crate::error::{Result, SolverError};
use crate::instance::{Cost, TspInstance};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Represents a solution to the TSP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// The tour as a permutation of city indices, implicitly closed
    pub tour: Vec<usize>,
    /// Total tour length including the closing edge
    pub cost: Cost,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
}

impl Solution {
    /// Create a solution from a tour, checking that it visits every city once
    pub fn from_tour(instance: &TspInstance, tour: Vec<usize>, algorithm: &str) -> Result<Self> {
        check_permutation(instance, &tour)?;
        Ok(Self::from_valid_tour(instance, tour, algorithm))
    }

    /// Create a solution from a tour the caller built as a permutation
    pub(crate) fn from_valid_tour(instance: &TspInstance, tour: Vec<usize>, algorithm: &str) -> Self {
        debug_assert!(check_permutation(instance, &tour).is_ok());
        let cost = instance.tour_length(&tour);
        Solution {
            tour,
            cost,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Recompute the cost from scratch and compare with the stored value
    pub fn validate(&self, instance: &TspInstance) -> bool {
        self.is_complete(instance) && instance.tour_length(&self.tour) == self.cost
    }

    /// Check if all cities are visited exactly once
    pub fn is_complete(&self, instance: &TspInstance) -> bool {
        check_permutation(instance, &self.tour).is_ok()
    }

    /// Apply a 2-opt move (reverse segment between i and j inclusive)
    pub fn apply_two_opt(&mut self, i: usize, j: usize) {
        self.tour[i..=j].reverse();
    }

    /// Two-line text form: space separated tour, then the cost
    pub fn to_out_string(&self) -> String {
        let tour: Vec<String> = self.tour.iter().map(|c| c.to_string()).collect();
        format!("{}\n{}\n", tour.join(" "), self.cost)
    }

    /// Write the two-line text form to `path`
    pub fn write_out<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_out_string())?;
        Ok(())
    }

    /// Write the solution as pretty JSON to `path`
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

fn check_permutation(instance: &TspInstance, tour: &[usize]) -> Result<()> {
    let n = instance.dimension;
    if tour.len() != n {
        return Err(SolverError::invalid_tour(format!(
            "tour has {} cities, instance has {}",
            tour.len(),
            n
        )));
    }

    let mut seen = vec![false; n];
    for &city in tour {
        if city >= n {
            return Err(SolverError::IndexOutOfRange { index: city, size: n });
        }
        if seen[city] {
            return Err(SolverError::invalid_tour(format!("city {} visited twice", city)));
        }
        seen[city] = true;
    }
    Ok(())
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Cost: {}", self.cost)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Iterations: {}", iter)?;
        }
        writeln!(f, "  Tour: {:?}", self.tour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::tests::four_city_instance;

    #[test]
    fn test_solution_creation() {
        let instance = four_city_instance();
        let sol = Solution::from_tour(&instance, vec![0, 1, 3, 2], "test").unwrap();
        assert_eq!(sol.cost, 80);
        assert!(sol.validate(&instance));
        assert_eq!(sol.iterations, None);
    }

    #[test]
    fn test_from_tour_rejects_non_permutations() {
        let instance = four_city_instance();
        assert!(matches!(
            Solution::from_tour(&instance, vec![0, 1, 1, 2], "dup"),
            Err(SolverError::InvalidTour(_))
        ));
        assert!(matches!(
            Solution::from_tour(&instance, vec![0, 1, 2], "short"),
            Err(SolverError::InvalidTour(_))
        ));
        assert!(matches!(
            Solution::from_tour(&instance, vec![0, 1, 2, 7], "range"),
            Err(SolverError::IndexOutOfRange { index: 7, size: 4 })
        ));
    }

    #[test]
    fn test_apply_two_opt_reverses_segment() {
        let instance = four_city_instance();
        let mut sol = Solution::from_tour(&instance, vec![0, 2, 1, 3], "test").unwrap();
        sol.apply_two_opt(1, 2);
        assert_eq!(sol.tour, vec![0, 1, 2, 3]);
        assert!(sol.is_complete(&instance));
    }

    #[test]
    fn test_out_format() {
        let instance = four_city_instance();
        let sol = Solution::from_tour(&instance, vec![0, 1, 3, 2], "test").unwrap();
        assert_eq!(sol.to_out_string(), "0 1 3 2\n80\n");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("four_exact.out");
        sol.write_out(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "0 1 3 2\n80\n");
    }
}
