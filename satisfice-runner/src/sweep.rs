//! Parameter sweep over the experiment grid.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use satisfice_core::{
    simulate_trial, RngHierarchy, SeedScope, SelectionRule, TrialConfig, TrialOutcome,
};

use crate::aggregate::ConfigSummary;
use crate::config::{ExperimentConfig, ExperimentError};

/// `1/e`, the classic secretary-problem exploration fraction.
pub const INVERSE_E: f64 = 1.0 / std::f64::consts::E;

/// Parameter grid specification.
///
/// The cross-product of every axis is swept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    pub pool_sizes: Vec<usize>,
    pub explore_fractions: Vec<f64>,
    /// Add `1/e` to the fraction axis.
    pub include_inverse_e: bool,
    pub k_values: Vec<f64>,
    pub rules: Vec<SelectionRule>,
}

impl Default for ParamGrid {
    /// Pool sizes 100, 500, 1000; fractions 0.1..=0.9 plus 1/e; k of 1%, 5%, 10%;
    /// every rule.
    fn default() -> Self {
        Self {
            pool_sizes: vec![100, 500, 1000],
            explore_fractions: vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9],
            include_inverse_e: true,
            k_values: vec![0.01, 0.05, 0.1],
            rules: SelectionRule::ALL.to_vec(),
        }
    }
}

impl ParamGrid {
    /// Fraction axis in ascending order, `1/e` included when requested.
    pub fn fractions(&self) -> Vec<f64> {
        let mut fractions = self.explore_fractions.clone();
        if self.include_inverse_e && !fractions.contains(&INVERSE_E) {
            fractions.push(INVERSE_E);
        }
        fractions.sort_by(|a, b| a.total_cmp(b));
        fractions.dedup();
        fractions
    }

    /// Returns the total number of configurations in this grid.
    pub fn size(&self) -> usize {
        self.pool_sizes.len() * self.fractions().len() * self.k_values.len() * self.rules.len()
    }

    /// Reject empty or repeated axis values and any point the simulator
    /// would refuse.
    pub fn validate(&self) -> Result<(), ExperimentError> {
        self.generate_configs().map(drop)
    }

    fn check_axes(&self) -> Result<(), ExperimentError> {
        if self.pool_sizes.is_empty() {
            return Err(ExperimentError::EmptyAxis("pool_sizes"));
        }
        if self.fractions().is_empty() {
            return Err(ExperimentError::EmptyAxis("explore_fractions"));
        }
        if self.k_values.is_empty() {
            return Err(ExperimentError::EmptyAxis("k_values"));
        }
        if self.rules.is_empty() {
            return Err(ExperimentError::EmptyAxis("rules"));
        }
        // Repeats would share a config id and seed stream.
        if has_repeats(&self.pool_sizes) {
            return Err(ExperimentError::DuplicateValue("pool_sizes"));
        }
        let fraction_bits: Vec<u64> = self.explore_fractions.iter().map(|f| f.to_bits()).collect();
        if has_repeats(&fraction_bits) {
            return Err(ExperimentError::DuplicateValue("explore_fractions"));
        }
        let k_bits: Vec<u64> = self.k_values.iter().map(|k| k.to_bits()).collect();
        if has_repeats(&k_bits) {
            return Err(ExperimentError::DuplicateValue("k_values"));
        }
        if has_repeats(&self.rules) {
            return Err(ExperimentError::DuplicateValue("rules"));
        }
        Ok(())
    }

    /// Generates all configurations, nested pool size → fraction → k → rule.
    ///
    /// Axes are checked first, so the result has no repeated config ids.
    pub fn generate_configs(&self) -> Result<Vec<TrialConfig>, ExperimentError> {
        self.check_axes()?;
        let fractions = self.fractions();
        let mut configs = Vec::with_capacity(self.size());

        for &n in &self.pool_sizes {
            for &f in &fractions {
                for &k in &self.k_values {
                    for &rule in &self.rules {
                        configs.push(TrialConfig::new(n, f, k, rule)?);
                    }
                }
            }
        }

        Ok(configs)
    }
}

fn has_repeats<T: Ord + Clone>(values: &[T]) -> bool {
    let mut sorted = values.to_vec();
    sorted.sort();
    sorted.windows(2).any(|w| w[0] == w[1])
}

/// All outcomes of one grid point, in trial order.
#[derive(Debug, Clone)]
pub struct ConfigRun {
    pub config: TrialConfig,
    pub config_id: String,
    pub outcomes: Vec<TrialOutcome>,
}

impl ConfigRun {
    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary::from_outcomes(&self.config, &self.outcomes)
    }
}

/// Parameter sweep executor.
///
/// Runs `trials_per_config` trials for every grid point, optionally in
/// parallel. Each trial draws from its own seed, so sequential and parallel
/// runs produce identical results.
#[derive(Debug, Clone)]
pub struct ParamSweep {
    trials_per_config: usize,
    rng: RngHierarchy,
    parallel: bool,
}

impl ParamSweep {
    pub fn new(trials_per_config: usize, master_seed: u64) -> Self {
        Self {
            trials_per_config,
            rng: RngHierarchy::new(master_seed),
            parallel: true,
        }
    }

    /// Sweep settings from an experiment config.
    pub fn from_experiment(experiment: &ExperimentConfig) -> Self {
        let run = &experiment.experiment;
        Self::new(run.trials_per_config, run.master_seed)
            .with_parallelism(run.parallel)
            .with_seed_scope(run.seed_scope)
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_seed_scope(mut self, scope: SeedScope) -> Self {
        self.rng = self.rng.with_scope(scope);
        self
    }

    pub fn trials_per_config(&self) -> usize {
        self.trials_per_config
    }

    /// Simulate every trial of a single configuration.
    pub fn run_config(&self, config: &TrialConfig) -> ConfigRun {
        let outcomes = (0..self.trials_per_config as u64)
            .map(|trial| simulate_trial(config, &mut self.rng.rng_for(config, trial)))
            .collect();
        ConfigRun {
            config: *config,
            config_id: config.config_id(),
            outcomes,
        }
    }

    /// Executes a sweep over the given grid.
    pub fn sweep(&self, grid: &ParamGrid) -> Result<SweepResults, ExperimentError> {
        self.sweep_with_progress(grid, |_, _, _| {})
    }

    /// Executes a sweep with progress reporting.
    ///
    /// The callback is invoked after each grid point completes with:
    /// - Number of grid points completed so far
    /// - Total number of grid points
    /// - The configuration just finished
    pub fn sweep_with_progress<F>(
        &self,
        grid: &ParamGrid,
        progress_callback: F,
    ) -> Result<SweepResults, ExperimentError>
    where
        F: Fn(usize, usize, &TrialConfig) + Send + Sync,
    {
        if self.trials_per_config == 0 {
            return Err(ExperimentError::ZeroTrials);
        }
        let configs = grid.generate_configs()?;
        let total = configs.len();

        for cfg in configs
            .iter()
            .filter(|c| c.explore_size() == 0 && c.rule().needs_prefix())
        {
            warn!(
                pool_size = cfg.pool_size(),
                explore_fraction = cfg.explore_fraction(),
                rule = %cfg.rule(),
                "empty exploration prefix: rule can never accept, every trial falls back"
            );
        }

        info!(
            configs = total,
            trials_per_config = self.trials_per_config,
            master_seed = self.rng.master_seed(),
            seed_scope = ?self.rng.scope(),
            parallel = self.parallel,
            "starting sweep"
        );

        let started = Instant::now();
        let completed = AtomicUsize::new(0);
        let run_one = |config: &TrialConfig| {
            let run = self.run_config(config);
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(
                config_id = %run.config_id,
                pool_size = config.pool_size(),
                explore_fraction = config.explore_fraction(),
                k = config.k(),
                rule = %config.rule(),
                done,
                total,
                "grid point finished"
            );
            progress_callback(done, total, config);
            run
        };

        // Each worker owns its ConfigRun buffer; collect() merges them back in grid order.
        let runs: Vec<ConfigRun> = if self.parallel {
            configs.par_iter().map(run_one).collect()
        } else {
            configs.iter().map(run_one).collect()
        };

        let elapsed = started.elapsed();
        let results = SweepResults::new(runs, elapsed);
        info!(
            configs = results.config_count(),
            outcomes = results.len(),
            elapsed_secs = elapsed.as_secs_f64(),
            "sweep finished"
        );
        Ok(results)
    }
}

/// Results from a parameter sweep, grouped by configuration in grid order.
#[derive(Debug, Clone)]
pub struct SweepResults {
    runs: Vec<ConfigRun>,
    elapsed: Duration,
}

impl SweepResults {
    pub fn new(runs: Vec<ConfigRun>, elapsed: Duration) -> Self {
        Self { runs, elapsed }
    }

    /// Per-configuration runs.
    pub fn runs(&self) -> &[ConfigRun] {
        &self.runs
    }

    /// Total number of outcomes across all configurations.
    pub fn len(&self) -> usize {
        self.runs.iter().map(|r| r.outcomes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config_count(&self) -> usize {
        self.runs.len()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn for_config(&self, config_id: &str) -> Option<&ConfigRun> {
        self.runs.iter().find(|r| r.config_id == config_id)
    }

    /// Every outcome tagged with its configuration and trial index.
    pub fn iter(&self) -> impl Iterator<Item = (&TrialConfig, usize, &TrialOutcome)> + '_ {
        self.runs.iter().flat_map(|run| {
            run.outcomes
                .iter()
                .enumerate()
                .map(move |(trial, outcome)| (&run.config, trial, outcome))
        })
    }

    /// One summary per configuration, in grid order.
    pub fn summaries(&self) -> Vec<ConfigSummary> {
        self.runs.iter().map(ConfigRun::summary).collect()
    }
}
