//! Satisfice Runner — experiment driver, aggregation, export.
//!
//! This crate builds on `satisfice-core` to provide:
//! - TOML experiment configuration with validated grids
//! - Sequential or rayon-parallel parameter sweeps with per-trial seeding
//! - Per-configuration summaries and optimal-fraction search
//! - CSV / JSON / Markdown export and artifact bundles

pub mod aggregate;
pub mod config;
pub mod export;
pub mod sweep;

pub use aggregate::{optimal_fractions, success_surface, ConfigSummary, OptimalFraction};
pub use config::{ExperimentConfig, ExperimentError, RunSettings};
pub use export::{
    generate_report, load_manifest, outcomes_csv, save_artifacts, summaries_csv,
    summaries_json, SweepManifest, SCHEMA_VERSION,
};
pub use sweep::{ConfigRun, ParamGrid, ParamSweep, SweepResults, INVERSE_E};
