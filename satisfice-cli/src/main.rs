//! Satisfice CLI — sweep, single-trial and grid inspection commands.
//!
//! Commands:
//! - `sweep` — run the experiment grid and write an artifact bundle
//! - `trial` — simulate one trial and print its outcome as JSON
//! - `grid` — print the resolved experiment config and grid size

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use satisfice_core::{simulate_trial, RngHierarchy, SeedScope, SelectionRule, TrialConfig};
use satisfice_runner::{optimal_fractions, save_artifacts, ExperimentConfig, ParamSweep};

#[derive(Parser)]
#[command(
    name = "satisfice",
    about = "Satisfice CLI — Monte Carlo study of good-enough secretary rules"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep the parameter grid and save summaries, report and outcomes.
    Sweep {
        /// Path to a TOML experiment file. Defaults to the built-in grid.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override trials per grid point.
        #[arg(long)]
        trials: Option<usize>,

        /// Override the master seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Run grid points one after another instead of on the thread pool.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Share pools across configs with the same pool size.
        #[arg(long, default_value_t = false)]
        common_random_numbers: bool,

        /// Skip the per-trial outcomes.csv.
        #[arg(long, default_value_t = false)]
        no_outcomes: bool,

        /// Output directory for the artifact bundle.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Simulate a single trial and print the outcome as JSON.
    Trial {
        /// Number of candidates.
        #[arg(long)]
        pool_size: usize,

        /// Exploration fraction in (0, 1).
        #[arg(long)]
        fraction: f64,

        /// Acceptance percentile in (0, 1).
        #[arg(long)]
        k: f64,

        /// best_explored, top_k_threshold or rank_based.
        #[arg(long)]
        rule: String,

        /// Seed for the trial's RNG.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Print the resolved experiment config as TOML.
    Grid {
        /// Path to a TOML experiment file. Defaults to the built-in grid.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Sweep {
            config,
            trials,
            seed,
            sequential,
            common_random_numbers,
            no_outcomes,
            output_dir,
        } => {
            let mut experiment = load_experiment(config.as_deref())?;
            if let Some(trials) = trials {
                experiment.experiment.trials_per_config = trials;
            }
            if let Some(seed) = seed {
                experiment.experiment.master_seed = seed;
            }
            if sequential {
                experiment.experiment.parallel = false;
            }
            if common_random_numbers {
                experiment.experiment.seed_scope = SeedScope::PerPoolSize;
            }
            experiment.validate()?;
            run_sweep_cmd(&experiment, &output_dir, !no_outcomes)
        }
        Commands::Trial {
            pool_size,
            fraction,
            k,
            rule,
            seed,
        } => run_trial_cmd(pool_size, fraction, k, &rule, seed),
        Commands::Grid { config } => run_grid_cmd(config.as_deref()),
    }
}

fn load_experiment(path: Option<&Path>) -> Result<ExperimentConfig> {
    match path {
        Some(p) => ExperimentConfig::load(p)
            .with_context(|| format!("failed to load experiment {}", p.display())),
        None => Ok(ExperimentConfig::default()),
    }
}

fn run_sweep_cmd(
    experiment: &ExperimentConfig,
    output_dir: &Path,
    include_outcomes: bool,
) -> Result<()> {
    let sweep = ParamSweep::from_experiment(experiment);
    let results = sweep.sweep_with_progress(&experiment.grid, |done, total, _| {
        if done % 10 == 0 || done == total {
            info!(done, total, "progress");
        }
    })?;

    let dir = save_artifacts(&results, experiment, output_dir, include_outcomes)?;

    println!(
        "{:>6} {:>6} {:>16} {:>9} {:>8} {:>8}",
        "pool", "k", "rule", "fraction", "success", "search"
    );
    for best in optimal_fractions(&results.summaries()) {
        println!(
            "{:>6} {:>6} {:>16} {:>9.3} {:>7.1}% {:>8.3}",
            best.pool_size,
            best.k,
            best.rule.name(),
            best.explore_fraction,
            best.success_rate * 100.0,
            best.mean_search_time
        );
    }
    println!("\nArtifacts written to {}", dir.display());
    Ok(())
}

fn run_trial_cmd(pool_size: usize, fraction: f64, k: f64, rule: &str, seed: u64) -> Result<()> {
    let rule: SelectionRule = rule.parse()?;
    let config = TrialConfig::new(pool_size, fraction, k, rule)?;
    let mut rng = RngHierarchy::new(seed).rng_for(&config, 0);
    let outcome = simulate_trial(&config, &mut rng);
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn run_grid_cmd(path: Option<&Path>) -> Result<()> {
    let experiment = load_experiment(path)?;
    print!("{}", experiment.to_toml_string()?);
    println!(
        "\n# {} grid points x {} trials = {} trials",
        experiment.grid.size(),
        experiment.experiment.trials_per_config,
        experiment.total_trials()
    );
    Ok(())
}

/// Initialise the `tracing` subscriber.
///
/// `RUST_LOG` overrides the default filter; `SATISFICE_LOG_JSON` switches to
/// JSON lines. Logs go to stderr so stdout stays machine-readable.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("satisfice=info,satisfice_runner=info"));

    if std::env::var("SATISFICE_LOG_JSON").is_ok() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_trial_command() {
        let cli = Cli::try_parse_from([
            "satisfice",
            "trial",
            "--pool-size",
            "100",
            "--fraction",
            "0.37",
            "--k",
            "0.05",
            "--rule",
            "rank-based",
        ])
        .unwrap();
        match cli.command {
            Commands::Trial {
                pool_size, rule, seed, ..
            } => {
                assert_eq!(pool_size, 100);
                assert_eq!(rule, "rank-based");
                assert_eq!(seed, 42);
            }
            _ => panic!("expected trial command"),
        }
    }

    #[test]
    fn parses_sweep_overrides() {
        let cli = Cli::try_parse_from([
            "satisfice",
            "sweep",
            "--trials",
            "10",
            "--sequential",
            "--common-random-numbers",
        ])
        .unwrap();
        match cli.command {
            Commands::Sweep {
                trials,
                sequential,
                common_random_numbers,
                output_dir,
                ..
            } => {
                assert_eq!(trials, Some(10));
                assert!(sequential);
                assert!(common_random_numbers);
                assert_eq!(output_dir, PathBuf::from("results"));
            }
            _ => panic!("expected sweep command"),
        }
    }
}
