use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use intsimplex_solver::{Method, Model, Sense, Solution, Solver};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "intsimplex")]
#[command(about = "Solve integer linear programs with simplex and branch-and-bound", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a model with all decision variables restricted to integers
    Solve {
        /// JSON file containing the model
        file: PathBuf,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
        /// Show branching statistics
        #[arg(short, long)]
        stats: bool,
        #[command(flatten)]
        limits: Limits,
    },
    /// Solve only the linear relaxation of a model
    Relax {
        /// JSON file containing the model
        file: PathBuf,
        /// Simplex variant to use
        #[arg(short, long, value_enum, default_value_t = MethodArg::Auto)]
        method: MethodArg,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
        #[command(flatten)]
        limits: Limits,
    },
    /// Check a model file for shape errors
    Check {
        /// The file to check
        file: PathBuf,
    },
}

#[derive(clap::Args)]
struct Limits {
    /// Maximum pivots per simplex loop
    #[arg(long, default_value_t = 10000)]
    max_iterations: usize,
    /// Floating point tolerance used while pivoting
    #[arg(long, default_value_t = 1e-9)]
    tolerance: f64,
    /// Distance from an integer below which a value counts as integral
    #[arg(long, default_value_t = 1e-10)]
    integrality_tolerance: f64,
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    Auto,
    Primal,
    Dual,
}

impl From<MethodArg> for Method {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Auto => Method::Auto,
            MethodArg::Primal => Method::Primal,
            MethodArg::Dual => Method::Dual,
        }
    }
}

impl Limits {
    fn solver(&self) -> Solver {
        Solver::new()
            .with_max_iterations(self.max_iterations)
            .with_tolerance(self.tolerance)
            .with_integrality_tolerance(self.integrality_tolerance)
    }
}

/// On-disk model: the matrix form plus the optimization direction
#[derive(Debug, Deserialize)]
struct ModelFile {
    #[serde(flatten)]
    model: Model,
    #[serde(default)]
    sense: Sense,
}

fn read_model(file: &Path) -> ModelFile {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    };

    match serde_json::from_str(&source) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_solution(solution: &Solution, sense: Sense) {
    let label = if sense.is_maximize() { "Maximum" } else { "Minimum" };
    println!("Status: OPTIMAL");
    println!("{}: {}", label, solution.objective_value);
    println!();
    println!("Variables:");
    for (i, value) in solution.values().iter().enumerate() {
        println!("  x{:<6} {:12.4}", i, value);
    }
    println!("Slacks:");
    for (i, value) in solution.slacks().iter().enumerate() {
        println!("  s{:<6} {:12.4}", i, value);
    }
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Solve { file, format, stats, limits } => {
            let input = read_model(&file);
            log::info!("solving {}", file.display());

            let (solution, branch_stats) = match limits.solver().solve_with_stats(&input.model, input.sense) {
                Ok(result) => result,
                Err(e) => {
                    eprintln!("Status: FAILED");
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            };

            if format == "json" {
                let output = if stats {
                    serde_json::json!({
                        "solution": solution,
                        "stats": {
                            "rounds": branch_stats.rounds,
                            "nodes": branch_stats.nodes,
                            "pruned": branch_stats.pruned,
                        },
                    })
                } else {
                    serde_json::json!(solution)
                };
                println!("{}", serde_json::to_string_pretty(&output).unwrap_or_else(|e| format!("Error: {}", e)));
            } else {
                print_solution(&solution, input.sense);
                if stats {
                    println!();
                    println!("Branching rounds: {}", branch_stats.rounds);
                    println!("Nodes solved:     {}", branch_stats.nodes);
                    println!("Nodes pruned:     {}", branch_stats.pruned);
                }
            }
        }
        Commands::Relax { file, method, format, limits } => {
            let input = read_model(&file);
            log::info!("solving relaxation of {}", file.display());

            let solution = match limits.solver().solve_relaxation(&input.model, input.sense, method.into()) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Status: FAILED");
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            };

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&solution).unwrap_or_else(|e| format!("Error: {}", e)));
            } else {
                print_solution(&solution, input.sense);
            }
        }
        Commands::Check { file } => {
            let input = read_model(&file);
            match input.model.validate() {
                Ok(()) => {
                    println!("✓ {} is valid", file.display());
                    println!("  {} variables", input.model.num_variables());
                    println!("  {} constraints", input.model.num_constraints());
                    println!("  sense: {:?}", input.sense);
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
