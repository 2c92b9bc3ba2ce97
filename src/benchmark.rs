//! Benchmarking and experimentation module for the TSP solvers.
//!
//! Provides tools for running the four solution methods over instance sets,
//! collecting statistics, tuning the GRASP greediness parameter and
//! comparing methods on a single instance.

use crate::error::{Result, SolverError};
use crate::exact::{BranchAndBoundConfig, BranchAndBoundSolver, SearchStatus};
use crate::heuristics::construction::{ConstructionHeuristic, NearestNeighborHeuristic};
use crate::heuristics::grasp::{Grasp, GraspConfig};
use crate::heuristics::local_search::TwoOptSearch;
use crate::instance::{Cost, TspInstance};
use crate::solution::Solution;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Solution method selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Method {
    /// Nearest neighbor construction
    Constructive,
    /// Nearest neighbor followed by 2-opt
    LocalSearch,
    /// GRASP (randomized construction + 2-opt restarts)
    Grasp,
    /// Branch-and-bound with an MST bound
    Exact,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Constructive, Method::LocalSearch, Method::Grasp, Method::Exact];

    /// Short name used in output file names and tables
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Constructive => "constructive",
            Method::LocalSearch => "local_search",
            Method::Grasp => "grasp",
            Method::Exact => "exact",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of running one method on one instance
#[derive(Debug, Clone)]
pub struct MethodRun {
    pub method: Method,
    pub solution: Solution,
    /// Search status, only for the exact method
    pub status: Option<SearchStatus>,
}

/// Result of running a single algorithm on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Method name
    pub algorithm: String,
    /// Instance name
    pub instance: String,
    /// Number of cities
    pub dimension: usize,
    /// Tour cost
    pub cost: Cost,
    /// Computation time in seconds
    pub time: f64,
    /// Iterations or sweeps (if applicable)
    pub iterations: Option<usize>,
    /// Exact search status (exact method only)
    pub status: Option<SearchStatus>,
    /// Percentage gap to the proven optimum (if one is known)
    pub gap: Option<f64>,
}

impl AlgorithmResult {
    fn from_run(instance: &TspInstance, run: &MethodRun) -> Self {
        AlgorithmResult {
            algorithm: run.method.as_str().to_string(),
            instance: instance.name.clone(),
            dimension: instance.dimension,
            cost: run.solution.cost,
            time: run.solution.computation_time,
            iterations: run.solution.iterations,
            status: run.status,
            gap: None,
        }
    }
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    pub algorithm: String,
    /// Number of instances solved
    pub num_instances: usize,
    pub avg_cost: f64,
    pub best_cost: Cost,
    pub worst_cost: Cost,
    pub std_cost: f64,
    pub avg_time: f64,
    pub total_time: f64,
    /// Average gap over instances with a proven optimum
    pub avg_gap: Option<f64>,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Start city for the constructive and local search methods
    pub start: usize,
    /// GRASP parameters
    pub grasp: GraspConfig,
    /// Instances above this size run GRASP with `large_instance_iterations`
    pub large_instance_threshold: usize,
    pub large_instance_iterations: usize,
    /// Largest instance handed to the exact solver
    pub exact_max_size: usize,
    /// Exact solver time limit in seconds
    pub exact_time_limit: f64,
    /// Run instances in parallel
    pub parallel: bool,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            start: 0,
            grasp: GraspConfig::default(),
            large_instance_threshold: 500,
            large_instance_iterations: 20,
            exact_max_size: 20,
            exact_time_limit: 60.0,
            parallel: true,
            show_progress: true,
        }
    }
}

impl BenchmarkConfig {
    pub fn validate(&self) -> Result<()> {
        self.grasp.validate()?;
        BranchAndBoundConfig { time_limit: self.exact_time_limit }.validate()
    }

    /// GRASP parameters for an instance of `dimension` cities
    pub fn grasp_config_for(&self, dimension: usize) -> GraspConfig {
        let mut config = self.grasp.clone();
        if dimension > self.large_instance_threshold {
            config.iterations = config.iterations.min(self.large_instance_iterations).max(1);
        }
        config
    }
}

/// Run one method on an instance with the parameters in `config`
pub fn run_method(instance: &TspInstance, method: Method, config: &BenchmarkConfig) -> Result<MethodRun> {
    let (solution, status) = match method {
        Method::Constructive => {
            let nn = NearestNeighborHeuristic::from_start(config.start);
            (nn.construct(instance)?, None)
        }
        Method::LocalSearch => {
            let initial = NearestNeighborHeuristic::from_start(config.start).construct(instance)?;
            let mut sol = TwoOptSearch::new().solve(instance, Some(&initial))?;
            sol.algorithm = format!("{} + {}", initial.algorithm, sol.algorithm);
            sol.computation_time += initial.computation_time;
            (sol, None)
        }
        Method::Grasp => {
            let grasp = Grasp::new(config.grasp_config_for(instance.dimension))?;
            (grasp.run(instance), None)
        }
        Method::Exact => {
            let solver = BranchAndBoundSolver::new(BranchAndBoundConfig {
                time_limit: config.exact_time_limit,
            })?;
            let result = solver.solve(instance)?;
            (result.solution, Some(result.status))
        }
    };

    Ok(MethodRun { method, solution, status })
}

/// Percentage gap of `cost` above `optimum`; undefined for a zero optimum
pub fn gap_percent(cost: Cost, optimum: Cost) -> Option<f64> {
    if optimum == 0 {
        return None;
    }
    Some((cost as f64 - optimum as f64) / optimum as f64 * 100.0)
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<AlgorithmResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Benchmark {
            config,
            results: Vec::new(),
        })
    }

    /// Run every applicable method on `instance` without recording anything
    pub fn run_instance(&self, instance: &TspInstance) -> Result<Vec<AlgorithmResult>> {
        let mut rows = Vec::with_capacity(Method::ALL.len());
        for method in Method::ALL {
            if method == Method::Exact && instance.dimension > self.config.exact_max_size {
                log::debug!(
                    "skipping exact solver on '{}' (n = {} > {})",
                    instance.name,
                    instance.dimension,
                    self.config.exact_max_size
                );
                continue;
            }
            let run = run_method(instance, method, &self.config)?;
            rows.push(AlgorithmResult::from_run(instance, &run));
        }

        let optimum = rows
            .iter()
            .find(|r| r.status == Some(SearchStatus::Optimal))
            .map(|r| r.cost);
        if let Some(optimum) = optimum {
            for row in rows.iter_mut() {
                row.gap = gap_percent(row.cost, optimum);
            }
        }
        Ok(rows)
    }

    /// Run full benchmark on an instance
    pub fn run_full_benchmark(&mut self, instance: &TspInstance) -> Result<()> {
        log::info!("Running benchmark on instance: {} (n = {})", instance.name, instance.dimension);
        let rows = self.run_instance(instance)?;
        self.results.extend(rows);
        Ok(())
    }

    /// Run benchmark on multiple instances; failing instances are logged and skipped
    pub fn run_on_instances(&mut self, instances: &[TspInstance]) {
        let pb = if self.config.show_progress {
            create_progress_bar(instances.len() as u64)
        } else {
            ProgressBar::hidden()
        };

        let run_one = |instance: &TspInstance| {
            pb.set_message(instance.name.clone());
            let rows = self.run_instance(instance);
            pb.inc(1);
            (instance.name.clone(), rows)
        };

        let outcomes: Vec<_> = if self.config.parallel {
            instances.par_iter().map(run_one).collect()
        } else {
            instances.iter().map(run_one).collect()
        };
        pb.finish_and_clear();

        for (name, rows) in outcomes {
            match rows {
                Ok(rows) => self.results.extend(rows),
                Err(e) => log::error!("benchmark failed on '{}': {}", name, e),
            }
        }
    }

    /// Compute statistics for each algorithm
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut by_algorithm: BTreeMap<&str, Vec<&AlgorithmResult>> = BTreeMap::new();
        for result in &self.results {
            by_algorithm.entry(result.algorithm.as_str()).or_default().push(result);
        }

        let mut statistics: Vec<AlgorithmStatistics> = by_algorithm
            .into_iter()
            .map(|(algorithm, results)| {
                let costs: Vec<f64> = results.iter().map(|r| r.cost as f64).collect();
                let times: Vec<f64> = results.iter().map(|r| r.time).collect();
                let gaps: Vec<f64> = results.iter().filter_map(|r| r.gap).collect();
                let (avg_cost, std_cost) = mean_std(&costs);
                let (avg_time, _) = mean_std(&times);

                AlgorithmStatistics {
                    algorithm: algorithm.to_string(),
                    num_instances: results.len(),
                    avg_cost,
                    best_cost: results.iter().map(|r| r.cost).min().unwrap_or(0),
                    worst_cost: results.iter().map(|r| r.cost).max().unwrap_or(0),
                    std_cost,
                    avg_time,
                    total_time: times.iter().sum(),
                    avg_gap: if gaps.is_empty() { None } else { Some(mean_std(&gaps).0) },
                }
            })
            .collect();

        statistics.sort_by(|a, b| a.avg_cost.total_cmp(&b.avg_cost));
        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_writer(File::create(path)?);
        for result in &self.results {
            writer.serialize(result)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_writer(File::create(path)?);
        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("          TSP Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!(
            "Generated: {}\n\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        report.push_str("Algorithm Performance Summary:\n");
        report.push_str(&"-".repeat(80));
        report.push('\n');
        report.push_str(&format!(
            "{:<15} {:>10} {:>12} {:>12} {:>12} {:>12}\n",
            "Algorithm", "Instances", "Avg Cost", "Best Cost", "Avg Gap%", "Avg Time"
        ));
        report.push_str(&"-".repeat(80));
        report.push('\n');

        for stat in self.compute_statistics() {
            let gap_str = stat
                .avg_gap
                .map(|g| format!("{:.2}%", g))
                .unwrap_or_else(|| "-".to_string());

            report.push_str(&format!(
                "{:<15} {:>10} {:>12.2} {:>12} {:>12} {:>12.4}\n",
                stat.algorithm, stat.num_instances, stat.avg_cost, stat.best_cost, gap_str, stat.avg_time
            ));
        }

        report.push_str(&"-".repeat(80));
        report.push('\n');

        report.push_str("\nBest Solutions per Instance:\n");
        let mut instance_best: BTreeMap<&str, &AlgorithmResult> = BTreeMap::new();
        for result in &self.results {
            let entry = instance_best.entry(result.instance.as_str()).or_insert(result);
            if result.cost < entry.cost {
                *entry = result;
            }
        }
        for (instance, best) in &instance_best {
            let proven = if best.status == Some(SearchStatus::Optimal) || best.gap == Some(0.0) {
                " [optimal]"
            } else {
                ""
            };
            report.push_str(&format!("  {}: {} ({}){}\n", instance, best.cost, best.algorithm, proven));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }
}

/// Mean and population standard deviation; zero for an empty slice
fn mean_std(values: &[f64]) -> (f64, f64) {
    use statrs::statistics::Statistics;

    if values.is_empty() {
        return (0.0, 0.0);
    }
    (values.iter().mean(), values.iter().population_std_dev())
}

fn create_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Helper function to load `*.in` instances from a directory, sorted by size
///
/// Files that fail to parse are logged and skipped.
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<TspInstance>> {
    let mut instances = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map(|e| e == "in").unwrap_or(false) {
            match TspInstance::from_file(&path) {
                Ok(instance) => instances.push(instance),
                Err(e) => log::error!("skipping {}: {}", path.display(), e),
            }
        }
    }

    instances.sort_by(|a, b| a.dimension.cmp(&b.dimension).then_with(|| a.name.cmp(&b.name)));
    Ok(instances)
}

/// One row of a GRASP alpha sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlphaTuningRow {
    pub alpha: f64,
    pub runs: usize,
    pub avg_cost: f64,
    pub best_cost: Cost,
    pub std_cost: f64,
    pub avg_time: f64,
}

/// Run GRASP `runs` times for every alpha (seeds `seed`, `seed + 1`, ...)
pub fn tune_alpha(
    instance: &TspInstance,
    alphas: &[f64],
    iterations: usize,
    runs: usize,
    seed: u64,
) -> Result<Vec<AlphaTuningRow>> {
    if alphas.is_empty() || runs == 0 {
        return Err(SolverError::empty_result("alpha tuning needs at least one alpha and one run"));
    }

    alphas
        .par_iter()
        .map(|&alpha| -> Result<AlphaTuningRow> {
            let mut costs = Vec::with_capacity(runs);
            let mut times = Vec::with_capacity(runs);
            for run in 0..runs as u64 {
                let grasp = Grasp::new(GraspConfig {
                    iterations,
                    alpha,
                    seed: seed.wrapping_add(run),
                })?;
                let sol = grasp.run(instance);
                costs.push(sol.cost);
                times.push(sol.computation_time);
            }

            let float_costs: Vec<f64> = costs.iter().map(|&c| c as f64).collect();
            let (avg_cost, std_cost) = mean_std(&float_costs);
            log::debug!("alpha {} on '{}': mean cost {:.2}", alpha, instance.name, avg_cost);
            Ok(AlphaTuningRow {
                alpha,
                runs,
                avg_cost,
                best_cost: costs.iter().copied().min().unwrap_or(0),
                std_cost,
                avg_time: mean_std(&times).0,
            })
        })
        .collect()
}

/// Row with the lowest average cost; the first such alpha wins ties
pub fn best_alpha(rows: &[AlphaTuningRow]) -> Option<&AlphaTuningRow> {
    rows.iter().reduce(|best, row| if row.avg_cost < best.avg_cost { row } else { best })
}

/// Export any serializable rows to CSV
pub fn write_csv<P: AsRef<Path>, T: Serialize>(rows: &[T], path: P) -> Result<()> {
    let mut writer = csv::Writer::from_writer(File::create(path)?);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Run each method once on `instance`, with gaps when the exact run is optimal
///
/// The exact method is left out for instances larger than `config.exact_max_size`.
pub fn compare_methods(instance: &TspInstance, config: &BenchmarkConfig) -> Result<Vec<AlgorithmResult>> {
    config.validate()?;
    let runs = Method::ALL
        .iter()
        .filter(|&&method| {
            let skip = method == Method::Exact && instance.dimension > config.exact_max_size;
            if skip {
                log::info!(
                    "exact solver skipped on '{}' (n = {} > {})",
                    instance.name,
                    instance.dimension,
                    config.exact_max_size
                );
            }
            !skip
        })
        .map(|&method| run_method(instance, method, config))
        .collect::<Result<Vec<_>>>()?;

    let mut rows: Vec<AlgorithmResult> = runs.iter().map(|run| AlgorithmResult::from_run(instance, run)).collect();
    let optimum = runs
        .iter()
        .find(|run| run.status == Some(SearchStatus::Optimal))
        .map(|run| run.solution.cost);
    if let Some(optimum) = optimum {
        for row in rows.iter_mut() {
            row.gap = gap_percent(row.cost, optimum);
        }
    }
    Ok(rows)
}
