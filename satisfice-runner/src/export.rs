//! Reporting and export — CSV, JSON, and Markdown artifact generation.
//!
//! Provides three export formats for sweep results:
//! - **CSV**: the per-trial outcome table and per-configuration summaries
//! - **JSON**: summaries and the run manifest, with schema versioning
//! - **Markdown**: a human-readable report with success-rate surfaces
//!
//! The manifest carries a `schema_version` field. Unknown versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::{optimal_fractions, success_surface, ConfigSummary};
use crate::config::ExperimentConfig;
use crate::sweep::SweepResults;

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Metadata describing one saved sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepManifest {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub experiment: ExperimentConfig,
    pub config_count: usize,
    pub outcome_count: usize,
    /// Whether `outcomes.csv` was written alongside the summaries.
    pub outcomes_written: bool,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export every trial as one CSV row, tagged by its configuration.
///
/// Columns: pool_size, explore_fraction, k, rule, trial, true_best,
/// k_threshold, selected, selected_index, selected_rank, is_top_k, is_best,
/// gap_to_best, gap_to_k_threshold, num_search, search_time, fell_back
pub fn outcomes_csv(results: &SweepResults) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "pool_size",
        "explore_fraction",
        "k",
        "rule",
        "trial",
        "true_best",
        "k_threshold",
        "selected",
        "selected_index",
        "selected_rank",
        "is_top_k",
        "is_best",
        "gap_to_best",
        "gap_to_k_threshold",
        "num_search",
        "search_time",
        "fell_back",
    ])?;

    for (config, trial, o) in results.iter() {
        wtr.write_record([
            config.pool_size().to_string(),
            config.explore_fraction().to_string(),
            config.k().to_string(),
            config.rule().to_string(),
            trial.to_string(),
            o.true_best.to_string(),
            o.k_threshold.to_string(),
            o.selected.to_string(),
            o.selected_index.to_string(),
            o.selected_rank.to_string(),
            o.is_top_k.to_string(),
            o.is_best.to_string(),
            o.gap_to_best.to_string(),
            o.gap_to_k_threshold.to_string(),
            o.num_search.to_string(),
            o.search_time.to_string(),
            o.fell_back.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export per-configuration summaries as CSV, one row per grid point.
pub fn summaries_csv(summaries: &[ConfigSummary]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for s in summaries {
        wtr.serialize(s)
            .with_context(|| format!("failed to serialize summary {}", s.config_id))?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize summaries to pretty JSON.
pub fn summaries_json(summaries: &[ConfigSummary]) -> Result<String> {
    serde_json::to_string_pretty(summaries).context("failed to serialize summaries to JSON")
}

/// Deserialize a manifest from JSON, rejecting unknown schema versions.
pub fn import_manifest_json(json: &str) -> Result<SweepManifest> {
    let manifest: SweepManifest =
        serde_json::from_str(json).context("failed to deserialize sweep manifest")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

// ─── Markdown reports ───────────────────────────────────────────────

/// Generate a Markdown report for a finished sweep.
pub fn generate_report(experiment: &ExperimentConfig, results: &SweepResults) -> String {
    let summaries = results.summaries();
    let grid = &experiment.grid;
    let run = &experiment.experiment;
    let mut md = String::with_capacity(4096);

    md.push_str("# Secretary Sweep Report\n\n");

    md.push_str("## Experiment\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Trials per config | {} |\n", run.trials_per_config));
    md.push_str(&format!("| Master seed | {} |\n", run.master_seed));
    md.push_str(&format!("| Seed scope | {:?} |\n", run.seed_scope));
    md.push_str(&format!("| Grid points | {} |\n", results.config_count()));
    md.push_str(&format!("| Trials | {} |\n", results.len()));
    md.push_str(&format!(
        "| Elapsed | {:.2}s |\n",
        results.elapsed().as_secs_f64()
    ));
    md.push('\n');

    md.push_str("## Success Rate (selected in true top-k)\n\n");
    for &n in &grid.pool_sizes {
        for &k in &grid.k_values {
            let surface = success_surface(&summaries, n, k, &grid.rules);
            if surface.is_empty() {
                continue;
            }
            md.push_str(&format!("### n = {}, k = {}\n\n", n, k));
            md.push_str("| Fraction |");
            for rule in &grid.rules {
                md.push_str(&format!(" {} |", rule));
            }
            md.push('\n');
            md.push_str("| --- |");
            for _ in &grid.rules {
                md.push_str(" --- |");
            }
            md.push('\n');
            for (fraction, cells) in surface {
                md.push_str(&format!("| {:.3} |", fraction));
                for cell in cells {
                    match cell {
                        Some(rate) => md.push_str(&format!(" {:.1}% |", rate * 100.0)),
                        None => md.push_str(" - |"),
                    }
                }
                md.push('\n');
            }
            md.push('\n');
        }
    }

    md.push_str("## Optimal Exploration Fractions\n\n");
    md.push_str("| Pool | k | Rule | Fraction | Success | Search Time |\n");
    md.push_str("| --- | --- | --- | --- | --- | --- |\n");
    for best in optimal_fractions(&summaries) {
        md.push_str(&format!(
            "| {} | {} | {} | {:.3} | {:.1}% | {:.3} |\n",
            best.pool_size,
            best.k,
            best.rule,
            best.explore_fraction,
            best.success_rate * 100.0,
            best.mean_search_time
        ));
    }

    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a sweep.
///
/// Creates a directory named `sweep_{timestamp}/` under `output_dir`
/// containing:
/// - `manifest.json` — experiment config, timing and counts
/// - `summary.csv` / `summary.json` — one row per grid point
/// - `report.md` — Markdown report
/// - `outcomes.csv` — every trial (only when `include_outcomes` is set)
///
/// Returns the path to the created directory.
pub fn save_artifacts(
    results: &SweepResults,
    experiment: &ExperimentConfig,
    output_dir: &Path,
    include_outcomes: bool,
) -> Result<PathBuf> {
    let created_at = Utc::now();
    let dirname = format!("sweep_{}", created_at.format("%Y%m%d_%H%M%S_%3f"));
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let manifest = SweepManifest {
        schema_version: SCHEMA_VERSION,
        created_at,
        duration_secs: results.elapsed().as_secs_f64(),
        experiment: experiment.clone(),
        config_count: results.config_count(),
        outcome_count: results.len(),
        outcomes_written: include_outcomes,
    };
    let manifest_json =
        serde_json::to_string_pretty(&manifest).context("failed to serialize sweep manifest")?;
    write_file(&run_dir.join("manifest.json"), &manifest_json)?;

    let summaries = results.summaries();
    write_file(&run_dir.join("summary.csv"), &summaries_csv(&summaries)?)?;
    write_file(&run_dir.join("summary.json"), &summaries_json(&summaries)?)?;
    write_file(&run_dir.join("report.md"), &generate_report(experiment, results))?;

    if include_outcomes {
        write_file(&run_dir.join("outcomes.csv"), &outcomes_csv(results)?)?;
    }

    info!(path = %run_dir.display(), outcomes = include_outcomes, "saved sweep artifacts");
    Ok(run_dir)
}

/// Load a `SweepManifest` from an artifact directory's manifest.json.
///
/// Rejects unknown schema versions.
pub fn load_manifest(dir: &Path) -> Result<SweepManifest> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_manifest_json(&json)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
