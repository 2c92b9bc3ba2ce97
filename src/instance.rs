//! Module for parsing and representing TSP instances.
//!
//! An instance file holds the number of cities `n` followed by exactly `n*n`
//! non-negative integers, read as a flat token stream in row-major order.
//! Line breaks inside the matrix carry no meaning.

use crate::error::{Result, SolverError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Integer tour and edge cost.
pub type Cost = u64;

/// A complete TSP instance backed by a dense distance matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TspInstance {
    /// Name of the instance (file stem when loaded from disk)
    pub name: String,
    /// Number of cities
    pub dimension: usize,
    /// Row-major `dimension × dimension` distances
    distances: Vec<Cost>,
    symmetric: bool,
}

impl TspInstance {
    /// Build an instance from an explicit square matrix
    pub fn from_matrix(name: &str, matrix: Vec<Vec<Cost>>) -> Result<Self> {
        let n = matrix.len();
        if n == 0 {
            return Err(SolverError::malformed("instance must contain at least one city"));
        }
        if let Some((row, values)) = matrix.iter().enumerate().find(|(_, r)| r.len() != n) {
            return Err(SolverError::malformed(format!(
                "row {} has {} values, expected {}",
                row,
                values.len(),
                n
            )));
        }

        Self::build(name, n, matrix.into_iter().flatten().collect())
    }

    fn build(name: &str, dimension: usize, distances: Vec<Cost>) -> Result<Self> {
        check_cost_range(dimension, &distances)?;

        let symmetric = (0..dimension).all(|i| {
            (i + 1..dimension).all(|j| distances[i * dimension + j] == distances[j * dimension + i])
        });
        Ok(TspInstance {
            name: name.to_string(),
            dimension,
            distances,
            symmetric,
        })
    }

    /// Parse an instance from its textual representation
    pub fn parse(name: &str, content: &str) -> Result<Self> {
        let mut tokens = content.split_whitespace();

        let header = tokens
            .next()
            .ok_or_else(|| SolverError::malformed("empty instance: missing city count"))?;
        let n: usize = header
            .parse()
            .map_err(|_| SolverError::malformed(format!("invalid city count '{}'", header)))?;
        if n < 1 {
            return Err(SolverError::malformed("city count must be at least 1"));
        }

        let distances = tokens
            .enumerate()
            .map(|(pos, tok)| {
                tok.parse::<Cost>().map_err(|_| {
                    SolverError::malformed(format!(
                        "invalid distance '{}' at position {}",
                        tok, pos
                    ))
                })
            })
            .collect::<Result<Vec<Cost>>>()?;

        let expected = n
            .checked_mul(n)
            .ok_or_else(|| SolverError::malformed(format!("city count {} is too large", n)))?;
        if distances.len() != expected {
            return Err(SolverError::malformed(format!(
                "expected {} distances for n = {}, found {}",
                expected,
                n,
                distances.len()
            )));
        }

        let instance = Self::build(name, n, distances)?;

        if !instance.is_symmetric() {
            log::warn!(
                "instance '{}' has an asymmetric matrix; the MST bound is not guaranteed to be valid",
                instance.name
            );
        }

        Ok(instance)
    }

    /// Load an instance from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "instance".to_string());

        let instance = Self::parse(&name, &content)?;
        log::debug!("loaded '{}' with {} cities", instance.name, instance.dimension);
        Ok(instance)
    }

    /// Distance from city `i` to city `j`
    ///
    /// Panics when either index is outside `[0, dimension)`.
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> Cost {
        assert!(
            i < self.dimension && j < self.dimension,
            "city index out of range: ({}, {}) for n = {}",
            i,
            j,
            self.dimension
        );
        self.distances[i * self.dimension + j]
    }

    /// Checked variant of [`TspInstance::distance`]
    pub fn try_distance(&self, i: usize, j: usize) -> Result<Cost> {
        for index in [i, j] {
            if index >= self.dimension {
                return Err(SolverError::IndexOutOfRange { index, size: self.dimension });
            }
        }
        Ok(self.distances[i * self.dimension + j])
    }

    /// Closed tour length, including the edge from the last city back to the first
    pub fn tour_length(&self, tour: &[usize]) -> Cost {
        let n = tour.len();
        (0..n).map(|i| self.distance(tour[i], tour[(i + 1) % n])).sum()
    }

    #[inline]
    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    /// Compute instance statistics
    pub fn statistics(&self) -> InstanceStatistics {
        let mut distances: Vec<Cost> = Vec::new();
        for i in 0..self.dimension {
            for j in 0..self.dimension {
                if i != j {
                    distances.push(self.distance(i, j));
                }
            }
        }

        let avg_distance = if distances.is_empty() {
            0.0
        } else {
            distances.iter().map(|&d| d as f64).sum::<f64>() / distances.len() as f64
        };

        InstanceStatistics {
            name: self.name.clone(),
            dimension: self.dimension,
            symmetric: self.is_symmetric(),
            min_distance: distances.iter().copied().min().unwrap_or(0),
            max_distance: distances.iter().copied().max().unwrap_or(0),
            avg_distance,
        }
    }
}

/// Rejects matrices whose largest entry could overflow a tour cost or a
/// branch-and-bound lower bound, both of which add at most `2n + 2` entries.
fn check_cost_range(dimension: usize, distances: &[Cost]) -> Result<()> {
    let max = distances.iter().copied().max().unwrap_or(0);
    let terms = (dimension as Cost).saturating_mul(2).saturating_add(2);
    if max.checked_mul(terms).is_none() {
        return Err(SolverError::malformed(format!(
            "distance {} is too large for {} cities: tour costs would overflow",
            max, dimension
        )));
    }
    Ok(())
}

/// Statistics about a TSP instance (off-diagonal entries only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    pub symmetric: bool,
    pub min_distance: Cost,
    pub max_distance: Cost,
    pub avg_distance: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Cities: {}", self.dimension)?;
        writeln!(f, "  Symmetric: {}", self.symmetric)?;
        writeln!(f, "  Min distance: {}", self.min_distance)?;
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Max distance: {}", self.max_distance)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;
    use std::io::Write;

    /// Four cities with a unique optimum of 80 (0-1-3-2-0 and its reverse)
    pub(crate) fn four_city_instance() -> TspInstance {
        TspInstance::from_matrix(
            "four",
            vec![
                vec![0, 10, 15, 20],
                vec![10, 0, 35, 25],
                vec![15, 35, 0, 30],
                vec![20, 25, 30, 0],
            ],
        )
        .unwrap()
    }

    /// Symmetric random instance with distances in `1..=100`
    pub(crate) fn random_instance(n: usize, seed: u64) -> TspInstance {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut matrix = vec![vec![0; n]; n];
        for i in 0..n {
            for j in i + 1..n {
                let d = rng.gen_range(1..=100);
                matrix[i][j] = d;
                matrix[j][i] = d;
            }
        }
        TspInstance::from_matrix("random", matrix).unwrap()
    }

    #[test]
    fn test_parse_flat_stream() {
        let instance = TspInstance::parse("t", "3\n0 1 2 1\n0 3\n2 3 0\n").unwrap();
        assert_eq!(instance.dimension, 3);
        assert_eq!(instance.distance(0, 2), 2);
        assert_eq!(instance.distance(1, 2), 3);
        assert_eq!(instance.distance(2, 1), 3);
    }

    #[test]
    fn test_parse_rejects_missing_tokens() {
        let mut content = String::from("5\n");
        for _ in 0..24 {
            content.push_str("1 ");
        }
        let err = TspInstance::parse("short", &content).unwrap_err();
        assert!(matches!(err, SolverError::MalformedInstance(_)));
    }

    #[test]
    fn test_parse_rejects_extra_tokens() {
        let err = TspInstance::parse("long", "1\n0 4\n").unwrap_err();
        assert!(matches!(err, SolverError::MalformedInstance(_)));
    }

    #[test]
    fn test_parse_rejects_zero_and_garbage() {
        assert!(matches!(
            TspInstance::parse("zero", "0\n"),
            Err(SolverError::MalformedInstance(_))
        ));
        assert!(matches!(
            TspInstance::parse("neg", "2\n0 -1 1 0\n"),
            Err(SolverError::MalformedInstance(_))
        ));
        assert!(matches!(
            TspInstance::parse("empty", "   \n"),
            Err(SolverError::MalformedInstance(_))
        ));
    }

    #[test]
    fn test_rejects_distances_that_overflow_tour_costs() {
        let err = TspInstance::parse("huge", "2\n0 9223372036854775808\n9223372036854775808 0\n").unwrap_err();
        assert!(matches!(err, SolverError::MalformedInstance(_)));

        let err = TspInstance::from_matrix("huge", vec![vec![0, u64::MAX], vec![u64::MAX, 0]]).unwrap_err();
        assert!(matches!(err, SolverError::MalformedInstance(_)));

        // the largest distance that still fits: 2n + 2 = 6 terms for two cities
        let limit = u64::MAX / 6;
        let instance = TspInstance::from_matrix("large", vec![vec![0, limit], vec![limit, 0]]).unwrap();
        assert_eq!(instance.tour_length(&[0, 1]), 2 * limit);
    }

    #[test]
    fn test_from_matrix_rejects_ragged_rows() {
        let err = TspInstance::from_matrix("ragged", vec![vec![0, 1], vec![1]]).unwrap_err();
        assert!(matches!(err, SolverError::MalformedInstance(_)));
    }

    #[test]
    fn test_from_file_uses_stem_as_name() {
        let mut file = tempfile::Builder::new().suffix(".in").tempfile().unwrap();
        write!(file, "2\n0 7\n7 0\n").unwrap();
        let instance = TspInstance::from_file(file.path()).unwrap();
        assert_eq!(instance.dimension, 2);
        assert_eq!(instance.distance(0, 1), 7);
        let stem = file.path().file_stem().unwrap().to_string_lossy().into_owned();
        assert_eq!(instance.name, stem);
    }

    #[test]
    fn test_try_distance_out_of_range() {
        let instance = four_city_instance();
        assert_eq!(instance.try_distance(1, 3).unwrap(), 25);
        assert!(matches!(
            instance.try_distance(4, 0),
            Err(SolverError::IndexOutOfRange { index: 4, size: 4 })
        ));
    }

    #[test]
    #[should_panic]
    fn test_distance_panics_out_of_range() {
        four_city_instance().distance(0, 9);
    }

    #[test]
    fn test_tour_length_includes_closing_edge() {
        let instance = four_city_instance();
        assert_eq!(instance.tour_length(&[0, 1, 3, 2]), 10 + 25 + 30 + 15);
    }

    #[test]
    fn test_asymmetric_detection() {
        let instance = TspInstance::from_matrix("asym", vec![vec![0, 1], vec![2, 0]]).unwrap();
        assert!(!instance.is_symmetric());
        assert!(four_city_instance().is_symmetric());
    }

    #[test]
    fn test_statistics() {
        let stats = four_city_instance().statistics();
        assert!(stats.symmetric);
        assert_eq!(stats.min_distance, 10);
        assert_eq!(stats.max_distance, 35);
        assert!((stats.avg_distance - 22.5).abs() < 1e-9);
    }
}
