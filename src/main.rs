//! TSP Solver - Command Line Interface
//!
//! Solves symmetric TSP instances with nearest neighbor, 2-opt, GRASP or
//! branch-and-bound, and runs benchmarks over instance directories.

use clap::{Parser, Subcommand};
use tsp_solver::benchmark::{
    best_alpha, compare_methods, load_instances_from_dir, run_method, tune_alpha, write_csv, Benchmark,
    BenchmarkConfig, Method,
};
use tsp_solver::heuristics::construction::{ConstructionHeuristic, NearestNeighborHeuristic};
use tsp_solver::heuristics::grasp::GraspConfig;
use tsp_solver::instance::TspInstance;
use tsp_solver::Result;

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "tsp-solver")]
#[command(version = "1.0")]
#[command(about = "Nearest neighbor, 2-opt, GRASP and branch-and-bound for the symmetric TSP")]
struct Cli {
    /// Debug logging and extra output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve one instance and write `<stem>_<method>.out`
    Solve {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Solution method
        #[arg(short, long, value_enum, default_value = "grasp")]
        method: Method,

        /// Start city for constructive and local search
        #[arg(long, default_value = "0")]
        start: usize,

        /// GRASP iterations
        #[arg(long, default_value = "50")]
        iterations: usize,

        /// GRASP greediness in [0, 1]
        #[arg(short, long, default_value = "0.2")]
        alpha: f64,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Exact solver time limit in seconds
        #[arg(short, long, default_value = "300")]
        time_limit: f64,

        /// Directory for the `.out` file
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Also write the solution as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Run all methods on a directory of `.in` instances
    Benchmark {
        /// Directory containing instance files
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// GRASP iterations (reduced for very large instances)
        #[arg(long, default_value = "50")]
        iterations: usize,

        /// GRASP greediness
        #[arg(short, long, default_value = "0.2")]
        alpha: f64,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Largest instance given to the exact solver
        #[arg(long, default_value = "20")]
        exact_max_size: usize,

        /// Exact solver time limit
        #[arg(long, default_value = "60")]
        exact_time_limit: f64,

        /// Maximum instance size
        #[arg(long)]
        max_size: Option<usize>,

        /// Run instances one after the other
        #[arg(long)]
        sequential: bool,
    },

    /// Sweep the GRASP alpha parameter on an instance
    Tune {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Alpha values to try
        #[arg(long, value_delimiter = ',', default_value = "0,0.1,0.2,0.3,0.4,0.5,0.6,0.7,0.8,0.9,1")]
        alphas: Vec<f64>,

        /// GRASP iterations per run
        #[arg(long, default_value = "50")]
        iterations: usize,

        /// Runs per alpha
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Seed of the first run
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare the four methods on an instance
    Compare {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Exact solver time limit
        #[arg(short, long, default_value = "60")]
        time_limit: f64,

        /// Largest instance given to the exact solver
        #[arg(long, default_value = "20")]
        exact_max_size: usize,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let outcome = match cli.command {
        Commands::Solve { instance, method, start, iterations, alpha, seed, time_limit, output_dir, json } => {
            let config = BenchmarkConfig {
                start,
                grasp: GraspConfig { iterations, alpha, seed },
                exact_time_limit: time_limit,
                large_instance_threshold: usize::MAX,
                ..Default::default()
            };
            solve_instance(&instance, method, &config, &output_dir, json.as_deref(), cli.verbose)
        }

        Commands::Benchmark {
            dir,
            output,
            iterations,
            alpha,
            seed,
            exact_max_size,
            exact_time_limit,
            max_size,
            sequential,
        } => {
            let config = BenchmarkConfig {
                grasp: GraspConfig { iterations, alpha, seed },
                exact_max_size,
                exact_time_limit,
                parallel: !sequential,
                ..Default::default()
            };
            run_benchmark(&dir, &output, config, max_size)
        }

        Commands::Tune { instance, alphas, iterations, runs, seed, output } => {
            tune_instance(&instance, &alphas, iterations, runs, seed, output.as_deref())
        }

        Commands::Compare { instance, time_limit, exact_max_size, seed, output } => {
            let config = BenchmarkConfig {
                grasp: GraspConfig { seed, ..Default::default() },
                exact_time_limit: time_limit,
                exact_max_size,
                ..Default::default()
            };
            compare_instance(&instance, &config, output.as_deref())
        }

        Commands::Analyze { instance } => analyze_instance(&instance),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn solve_instance(
    path: &Path,
    method: Method,
    config: &BenchmarkConfig,
    output_dir: &Path,
    json: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    println!("Loading instance from {:?}...", path);
    let instance = TspInstance::from_file(path)?;

    if verbose {
        println!("{}", instance.statistics());
    }

    println!("Solving {} with {}...", instance.name, method);
    let run = run_method(&instance, method, config)?;
    let solution = &run.solution;

    println!("\n========== Results ==========");
    println!("Algorithm: {}", solution.algorithm);
    println!("Cost: {}", solution.cost);
    println!("Time: {:.4}s", solution.computation_time);
    if let Some(iter) = solution.iterations {
        println!("Iterations: {}", iter);
    }
    if let Some(status) = run.status {
        println!("Status: {}", status);
    }
    if verbose {
        println!("Tour: {:?}", solution.tour);
    }

    std::fs::create_dir_all(output_dir)?;
    let out_path = output_dir.join(format!("{}_{}.out", instance.name, method.as_str()));
    solution.write_out(&out_path)?;
    println!("\nSolution written to {:?}", out_path);

    if let Some(json_path) = json {
        solution.write_json(json_path)?;
        println!("Solution saved to {:?}", json_path);
    }
    Ok(())
}

fn run_benchmark(dir: &Path, output: &Path, config: BenchmarkConfig, max_size: Option<usize>) -> Result<()> {
    println!("Loading instances from {:?}...", dir);
    let mut instances = load_instances_from_dir(dir)?;

    if let Some(max) = max_size {
        instances.retain(|i| i.dimension <= max);
    }

    println!("Found {} instances", instances.len());
    if instances.is_empty() {
        eprintln!("No instances found!");
        return Ok(());
    }

    std::fs::create_dir_all(output)?;

    let mut benchmark = Benchmark::new(config)?;
    benchmark.run_on_instances(&instances);

    let results_path = output.join("results.csv");
    benchmark.export_to_csv(&results_path)?;
    println!("\nResults exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    benchmark.export_statistics_csv(&stats_path)?;
    println!("Statistics exported to {:?}", stats_path);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    std::fs::write(&report_path, &report)?;
    println!("Report saved to {:?}", report_path);
    Ok(())
}

fn tune_instance(
    path: &Path,
    alphas: &[f64],
    iterations: usize,
    runs: usize,
    seed: u64,
    output: Option<&Path>,
) -> Result<()> {
    let instance = TspInstance::from_file(path)?;
    println!(
        "Tuning GRASP alpha on {} (n={}, {} iterations, {} runs per alpha)...\n",
        instance.name, instance.dimension, iterations, runs
    );

    let rows = tune_alpha(&instance, alphas, iterations, runs, seed)?;

    println!("{:<8} {:>12} {:>10} {:>10} {:>10}", "Alpha", "Avg Cost", "Best", "Std", "Avg Time");
    println!("{}", "-".repeat(54));
    for row in &rows {
        println!(
            "{:<8.2} {:>12.2} {:>10} {:>10.2} {:>10.4}",
            row.alpha, row.avg_cost, row.best_cost, row.std_cost, row.avg_time
        );
    }

    if let Some(best) = best_alpha(&rows) {
        println!("\nBest alpha: {} (avg cost {:.2})", best.alpha, best.avg_cost);
    }

    if let Some(out_path) = output {
        write_csv(&rows, out_path)?;
        println!("\nResults exported to {:?}", out_path);
    }
    Ok(())
}

fn compare_instance(path: &Path, config: &BenchmarkConfig, output: Option<&Path>) -> Result<()> {
    let instance = TspInstance::from_file(path)?;
    println!("Comparing methods on {} (n={})...\n", instance.name, instance.dimension);

    let rows = compare_methods(&instance, config)?;

    println!("{:<15} {:>12} {:>10} {:>12} {:>12}", "Method", "Cost", "Gap%", "Time", "Status");
    println!("{}", "-".repeat(65));
    for row in &rows {
        let gap = row.gap.map(|g| format!("{:.2}", g)).unwrap_or_else(|| "-".to_string());
        let status = row.status.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
        println!("{:<15} {:>12} {:>10} {:>12.4} {:>12}", row.algorithm, row.cost, gap, row.time, status);
    }
    if !rows.iter().any(|r| r.algorithm == Method::Exact.as_str()) {
        println!("{:<15} skipped (n = {} > {})", Method::Exact.as_str(), instance.dimension, config.exact_max_size);
    }

    if let Some(out_path) = output {
        write_csv(&rows, out_path)?;
        println!("\nResults exported to {:?}", out_path);
    }
    Ok(())
}

fn analyze_instance(path: &Path) -> Result<()> {
    let instance = TspInstance::from_file(path)?;

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    let nn = NearestNeighborHeuristic::new().construct(&instance)?;
    println!("Quick Solution Estimate:");
    println!("  Nearest Neighbor: {}", nn.cost);
    Ok(())
}
