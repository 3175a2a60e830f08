//! Satisfice Core — trial simulator for "good enough" secretary problems.
//!
//! This crate contains the stochastic heart of the study:
//! - Domain types (selection rule, validated trial config, trial outcome)
//! - Descriptive statistics (linear-interpolation quantile, ranks, k-threshold)
//! - Stopping-rule evaluation over the exploitation phase
//! - The trial simulator and its pool-level entry point
//! - Deterministic per-trial RNG derivation

pub mod domain;
pub mod engine;
pub mod rng;
pub mod stats;

pub use domain::{ConfigError, SelectionRule, TrialConfig, TrialOutcome};
pub use engine::{run_trial, select_from_pool, simulate_trial};
pub use rng::{RngHierarchy, SeedScope};
