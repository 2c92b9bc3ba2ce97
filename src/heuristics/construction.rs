use crate::error::{Result, SolverError};
use crate::instance::TspInstance;
use crate::solution::Solution;
use rand::prelude::*;

pub trait ConstructionHeuristic {
    fn construct(&self, instance: &TspInstance) -> Result<Solution>;
    fn name(&self) -> &str;
}

/// Nearest Neighbor Heuristic
///
/// Builds a tour by repeatedly visiting the nearest unvisited city.
/// Ties go to the smallest city index, so the result is reproducible.
pub struct NearestNeighborHeuristic {
    pub start: usize,
}

impl NearestNeighborHeuristic {
    pub fn new() -> Self {
        NearestNeighborHeuristic { start: 0 }
    }

    pub fn from_start(start: usize) -> Self {
        NearestNeighborHeuristic { start }
    }

    fn find_nearest(&self, instance: &TspInstance, current: usize, visited: &[bool]) -> Option<usize> {
        let mut best: Option<(usize, u64)> = None;
        for city in 0..instance.dimension {
            if visited[city] {
                continue;
            }
            let d = instance.distance(current, city);
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((city, d)),
            }
        }
        best.map(|(city, _)| city)
    }
}

impl Default for NearestNeighborHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for NearestNeighborHeuristic {
    fn construct(&self, instance: &TspInstance) -> Result<Solution> {
        let start = std::time::Instant::now();
        let n = instance.dimension;
        if self.start >= n {
            return Err(SolverError::IndexOutOfRange { index: self.start, size: n });
        }

        let mut tour = Vec::with_capacity(n);
        let mut visited = vec![false; n];
        tour.push(self.start);
        visited[self.start] = true;

        let mut current = self.start;
        while let Some(next) = self.find_nearest(instance, current, &visited) {
            tour.push(next);
            visited[next] = true;
            current = next;
        }

        let mut solution = Solution::from_valid_tour(instance, tour, self.name());
        solution.computation_time = start.elapsed().as_secs_f64();
        Ok(solution)
    }

    fn name(&self) -> &str {
        "NearestNeighbor"
    }
}

/// Randomized greedy construction driven by a restricted candidate list
///
/// At each step the candidates are the unvisited cities whose distance from
/// the current city is within `min + alpha * (max - min)`. `alpha = 0` keeps
/// only the nearest cities and `alpha = 1` makes every unvisited city eligible.
pub struct RandomizedGreedyConstruction {
    pub alpha: f64,
}

impl RandomizedGreedyConstruction {
    pub fn new(alpha: f64) -> Self {
        RandomizedGreedyConstruction { alpha }
    }

    /// Build a tour from a uniformly random start city
    pub fn construct_with_rng<R: Rng>(&self, instance: &TspInstance, rng: &mut R) -> Vec<usize> {
        let start = rng.gen_range(0..instance.dimension);
        self.construct_from(instance, start, rng)
    }

    /// Build a tour from `start`; `start` must be a valid city
    pub fn construct_from<R: Rng>(&self, instance: &TspInstance, start: usize, rng: &mut R) -> Vec<usize> {
        let n = instance.dimension;
        let mut tour = Vec::with_capacity(n);
        let mut visited = vec![false; n];
        tour.push(start);
        visited[start] = true;

        let mut current = start;
        let mut candidates: Vec<(usize, u64)> = Vec::with_capacity(n);
        let mut rcl: Vec<usize> = Vec::with_capacity(n);

        while tour.len() < n {
            candidates.clear();
            candidates.extend(
                (0..n)
                    .filter(|&c| !visited[c])
                    .map(|c| (c, instance.distance(current, c))),
            );

            let min_cost = candidates.iter().map(|&(_, d)| d).min().unwrap_or(0);
            let max_cost = candidates.iter().map(|&(_, d)| d).max().unwrap_or(0);
            let threshold = min_cost as f64 + self.alpha * (max_cost - min_cost) as f64;

            rcl.clear();
            rcl.extend(
                candidates
                    .iter()
                    .filter(|&&(_, d)| d as f64 <= threshold)
                    .map(|&(c, _)| c),
            );

            // alpha = 0 leaves only nearest cities; take the smallest index like NearestNeighborHeuristic
            let next = if self.alpha == 0.0 {
                rcl.first().copied()
            } else {
                rcl.choose(rng).copied()
            };
            let next = match next {
                Some(city) => city,
                None => candidates
                    .iter()
                    .min_by_key(|&&(c, d)| (d, c))
                    .map(|&(c, _)| c)
                    .unwrap_or(current),
            };

            tour.push(next);
            visited[next] = true;
            current = next;
        }

        tour
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::tests::{four_city_instance, random_instance};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_nearest_neighbor() {
        let instance = four_city_instance();
        let solution = NearestNeighborHeuristic::new().construct(&instance).unwrap();

        // 0 -> 1 (10) -> 3 (25) -> 2 (30) -> 0 (15)
        assert_eq!(solution.tour, vec![0, 1, 3, 2]);
        assert_eq!(solution.cost, 80);
        assert!(solution.validate(&instance));
    }

    #[test]
    fn test_nearest_neighbor_tie_breaks_on_index() {
        let instance = TspInstance::from_matrix(
            "ties",
            vec![vec![0, 5, 5, 5], vec![5, 0, 1, 1], vec![5, 1, 0, 1], vec![5, 1, 1, 0]],
        )
        .unwrap();
        let solution = NearestNeighborHeuristic::new().construct(&instance).unwrap();
        assert_eq!(solution.tour, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_nearest_neighbor_custom_start() {
        let instance = random_instance(12, 3);
        let solution = NearestNeighborHeuristic::from_start(7).construct(&instance).unwrap();
        assert_eq!(solution.tour[0], 7);
        assert!(solution.validate(&instance));
    }

    #[test]
    fn test_nearest_neighbor_rejects_bad_start() {
        let instance = four_city_instance();
        let err = NearestNeighborHeuristic::from_start(4).construct(&instance).unwrap_err();
        assert!(matches!(err, SolverError::IndexOutOfRange { index: 4, size: 4 }));
    }

    #[test]
    fn test_single_city() {
        let instance = TspInstance::from_matrix("one", vec![vec![0]]).unwrap();
        let solution = NearestNeighborHeuristic::new().construct(&instance).unwrap();
        assert_eq!(solution.tour, vec![0]);
        assert_eq!(solution.cost, 0);
    }

    #[test]
    fn test_randomized_greedy_alpha_zero_matches_nearest_neighbor() {
        let instance = random_instance(15, 11);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let builder = RandomizedGreedyConstruction::new(0.0);
        for start in 0..instance.dimension {
            let greedy = builder.construct_from(&instance, start, &mut rng);
            let nn = NearestNeighborHeuristic::from_start(start).construct(&instance).unwrap();
            assert_eq!(greedy, nn.tour);
        }
    }

    #[test]
    fn test_randomized_greedy_builds_permutations() {
        let instance = random_instance(20, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for alpha in [0.0, 0.3, 1.0] {
            let builder = RandomizedGreedyConstruction::new(alpha);
            let tour = builder.construct_with_rng(&instance, &mut rng);
            assert!(Solution::from_tour(&instance, tour, "grasp").is_ok());
        }
    }
}
