//! Serializable experiment configuration (TOML).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use satisfice_core::{ConfigError, SeedScope};

use crate::sweep::ParamGrid;

/// Errors from loading or validating an experiment.
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid experiment TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to render experiment TOML: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("trials_per_config must be at least 1")]
    ZeroTrials,
    #[error("grid axis '{0}' is empty")]
    EmptyAxis(&'static str),
    #[error("grid axis '{0}' repeats a value")]
    DuplicateValue(&'static str),
    #[error("invalid grid point: {0}")]
    InvalidPoint(#[from] ConfigError),
}

/// Full experiment: run settings plus the parameter grid.
///
/// Every field has a default, so a TOML file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub experiment: RunSettings,
    pub grid: ParamGrid,
}

/// Repetition count, seeding and scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Trials per grid point.
    pub trials_per_config: usize,
    pub master_seed: u64,
    /// Run grid points on the rayon pool.
    pub parallel: bool,
    pub seed_scope: SeedScope,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            trials_per_config: 1_000,
            master_seed: 42,
            parallel: true,
            seed_scope: SeedScope::PerConfig,
        }
    }
}

impl ExperimentConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ExperimentError> {
        let config: ExperimentConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ExperimentError> {
        let text = std::fs::read_to_string(path).map_err(|source| ExperimentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ExperimentError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject zero trials, empty or repeated axis values, and any grid point
    /// the simulator would refuse.
    pub fn validate(&self) -> Result<(), ExperimentError> {
        if self.experiment.trials_per_config == 0 {
            return Err(ExperimentError::ZeroTrials);
        }
        self.grid.validate()
    }

    /// Total trials the sweep will simulate.
    pub fn total_trials(&self) -> usize {
        self.grid.size() * self.experiment.trials_per_config
    }
}
