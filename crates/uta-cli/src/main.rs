use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uta_engine::{Instance, SolveResult, SolveStatus, SolverOptions, UtaSolver};

#[derive(Parser)]
#[command(name = "uta")]
#[command(about = "Infer additive utility functions from a reference ranking", long_about = None)]
struct Cli {
    /// Log solver progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an instance file for errors
    Check {
        /// The instance file
        file: PathBuf,
    },
    /// Fit utility functions to the reference ranking
    Solve {
        /// The instance file
        file: PathBuf,
        #[command(flatten)]
        tuning: Tuning,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
    /// Rank with utility functions from a saved result
    Rank {
        /// The instance file
        file: PathBuf,
        /// A result previously written by `solve --format json`
        #[arg(long)]
        state: PathBuf,
        #[command(flatten)]
        tuning: Tuning,
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
    /// Move one breakpoint and show the updated ranking
    Adjust {
        /// The instance file
        file: PathBuf,
        /// Criterion whose function is changed
        #[arg(long)]
        criterion: String,
        /// Index of the breakpoint, 0 being the worst value
        #[arg(long)]
        point: usize,
        /// New ordinate of the breakpoint
        #[arg(long)]
        value: f64,
        /// Start from a saved result instead of solving
        #[arg(long)]
        state: Option<PathBuf>,
        #[command(flatten)]
        tuning: Tuning,
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
}

/// Overrides for the instance settings
#[derive(clap::Args)]
struct Tuning {
    /// Minimum utility gap between consecutive ranks
    #[arg(long)]
    delta: Option<f64>,
    /// Let post-optimality ranges change the Kendall tau
    #[arg(long)]
    no_preserve_kendall: bool,
    /// Simplex iteration cap
    #[arg(long)]
    max_iterations: Option<usize>,
}

impl Tuning {
    fn options(&self, instance: &Instance) -> SolverOptions {
        let mut options = instance.options(SolverOptions::default());
        if let Some(delta) = self.delta {
            options.delta_threshold = delta;
        }
        if self.no_preserve_kendall {
            options.preserve_kendall_coefficient = false;
        }
        if let Some(max) = self.max_iterations {
            options.max_iterations = max;
        }
        options
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check { file } => {
            let instance = read_instance(&file);
            let options = instance.options(SolverOptions::default());
            match instance.context(options) {
                Ok(context) => {
                    println!("✓ {} is valid", file.display());
                    println!("  {} criteria", context.criteria().len());
                    println!("  {} alternatives", instance.alternatives.len());
                    println!("  {} rank groups", context.rank_groups());
                    println!("  {} unranked alternatives", context.unranked().len());
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Solve { file, tuning, format } => {
            let instance = read_instance(&file);
            let mut solver = build_solver(&instance, &tuning);
            match solver.solve() {
                Ok(result) => print_result(result, format),
                Err(e) => fail("Solve error", e),
            }
        }
        Commands::Rank {
            file,
            state,
            tuning,
            format,
        } => {
            let instance = read_instance(&file);
            let saved = read_result(&state);
            let mut solver = build_solver(&instance, &tuning);
            match solver.load_state(&saved.utility_functions, instance.reference_ranking(), instance.unranked()) {
                Ok(result) => print_result(result, format),
                Err(e) => fail("Load error", e),
            }
        }
        Commands::Adjust {
            file,
            criterion,
            point,
            value,
            state,
            tuning,
            format,
        } => {
            let instance = read_instance(&file);
            let mut solver = build_solver(&instance, &tuning);

            let start = match &state {
                Some(path) => {
                    let saved = read_result(path);
                    solver
                        .load_state(&saved.utility_functions, instance.reference_ranking(), instance.unranked())
                        .map(|_| ())
                }
                None => solver.solve().map(|_| ()),
            };
            if let Err(e) = start {
                fail("Solve error", e);
            }

            match solver.adjust_point(&criterion, point, value) {
                Ok(result) => print_result(result, format),
                Err(e) => fail("Adjust error", e),
            }
        }
    }
}

fn fail(context: &str, error: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", context, error);
    std::process::exit(1);
}

fn read_file(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => fail("Error reading file", e),
    }
}

/// Parse an instance and derive criterion ranges from its values
fn read_instance(path: &Path) -> Instance {
    let mut instance: Instance = match serde_json::from_str(&read_file(path)) {
        Ok(i) => i,
        Err(e) => fail("Parse error", e),
    };
    instance.update_criteria_ranges();
    debug!(
        path = %path.display(),
        criteria = instance.criteria.len(),
        alternatives = instance.alternatives.len(),
        "loaded instance"
    );
    instance
}

fn read_result(path: &Path) -> SolveResult {
    match serde_json::from_str(&read_file(path)) {
        Ok(r) => r,
        Err(e) => fail("Parse error", e),
    }
}

fn build_solver(instance: &Instance, tuning: &Tuning) -> UtaSolver {
    match instance.solver(tuning.options(instance)) {
        Ok(s) => s,
        Err(e) => fail("Invalid instance", e),
    }
}

fn print_result(result: &SolveResult, format: Format) {
    if format == Format::Json {
        match serde_json::to_string_pretty(result) {
            Ok(json) => println!("{}", json),
            Err(e) => fail("Serialization error", e),
        }
        return;
    }

    let status = match result.status {
        SolveStatus::Optimal => "OPTIMAL",
        SolveStatus::IterationLimit => "ITERATION LIMIT (not verified optimal)",
        SolveStatus::Restored => "RESTORED",
    };
    println!("Status: {}", status);
    if let Some(lp) = &result.lp {
        println!("Iterations: {}", lp.iterations);
        println!("Total violation: {:.6}", lp.total_violation);
        for violation in &lp.violations {
            println!("  ! {}", violation.description);
        }
    }
    println!("Kendall tau: {:.4}", result.kendall_tau);
    println!();

    println!("Ranking:");
    for entry in &result.ranking {
        let reference = entry
            .reference_rank
            .map(|r| format!("(reference {})", r + 1))
            .unwrap_or_default();
        println!(
            "  {:3}. {:20} {:10.6} {}",
            entry.position, entry.alternative, entry.utility, reference
        );
    }
    println!();

    println!("Utility functions:");
    for function in &result.utility_functions {
        println!("  {} (weight {:.4})", function.criterion, function.weight());
        for (i, point) in function.points.iter().enumerate() {
            println!(
                "    [{}] {:>12.4} -> {:.6}  range [{:.6}, {:.6}]",
                i, point.abscissa, point.ordinate, point.min_value, point.max_value
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_settings() {
        let cli = Cli::parse_from(["uta", "solve", "x.json", "--delta", "0.01", "--no-preserve-kendall"]);
        let Commands::Solve { tuning, format, .. } = cli.command else {
            panic!("expected solve");
        };
        assert!(format == Format::Pretty);

        let mut instance = Instance::default();
        instance.settings.delta_threshold = Some(0.5);
        instance.settings.max_iterations = Some(40);
        let options = tuning.options(&instance);
        assert_eq!(options.delta_threshold, 0.01);
        assert!(!options.preserve_kendall_coefficient);
        assert_eq!(options.max_iterations, 40);
    }
}
