//! Validated trial configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::rule::SelectionRule;

/// Smallest pool that has both an exploration and an exploitation phase.
pub const MIN_POOL_SIZE: usize = 2;

/// Invalid trial input. Raised before any random draw happens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("pool size must be at least {MIN_POOL_SIZE}, got {pool_size}")]
    PoolTooSmall { pool_size: usize },
    #[error("exploration fraction must lie in (0, 1), got {fraction}")]
    FractionOutOfRange { fraction: f64 },
    #[error("acceptance percentile k must lie in (0, 1), got {k}")]
    PercentileOutOfRange { k: f64 },
    #[error("candidate pool is empty")]
    EmptyPool,
    #[error("exploration size {explore_size} exceeds pool size {pool_size}")]
    ExploreSizeExceedsPool {
        explore_size: usize,
        pool_size: usize,
    },
}

/// One point of the experiment grid: pool size, exploration fraction,
/// acceptance percentile and rule.
///
/// Fields are private so that every instance has passed [`TrialConfig::new`];
/// deserialization runs the same checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTrialConfig")]
pub struct TrialConfig {
    pool_size: usize,
    explore_fraction: f64,
    k: f64,
    rule: SelectionRule,
}

#[derive(Deserialize)]
struct RawTrialConfig {
    pool_size: usize,
    explore_fraction: f64,
    k: f64,
    rule: SelectionRule,
}

impl TryFrom<RawTrialConfig> for TrialConfig {
    type Error = ConfigError;

    fn try_from(raw: RawTrialConfig) -> Result<Self, Self::Error> {
        TrialConfig::new(raw.pool_size, raw.explore_fraction, raw.k, raw.rule)
    }
}

impl TrialConfig {
    pub fn new(
        pool_size: usize,
        explore_fraction: f64,
        k: f64,
        rule: SelectionRule,
    ) -> Result<Self, ConfigError> {
        if pool_size < MIN_POOL_SIZE {
            return Err(ConfigError::PoolTooSmall { pool_size });
        }
        if !open_unit_interval(explore_fraction) {
            return Err(ConfigError::FractionOutOfRange {
                fraction: explore_fraction,
            });
        }
        validate_percentile(k)?;
        Ok(Self {
            pool_size,
            explore_fraction,
            k,
            rule,
        })
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn explore_fraction(&self) -> f64 {
        self.explore_fraction
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    pub fn rule(&self) -> SelectionRule {
        self.rule
    }

    /// Length of the exploration prefix: `floor(n * f)`.
    pub fn explore_size(&self) -> usize {
        explore_size(self.pool_size, self.explore_fraction)
    }

    /// Number of candidates in the true top-k set: `max(floor(n * k), 1)`.
    pub fn k_count(&self) -> usize {
        k_count(self.pool_size, self.k)
    }

    /// Content hash identifying this configuration.
    ///
    /// Two configs with bit-identical parameters share an id, so outcomes
    /// can be grouped by it.
    pub fn config_id(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.key_bytes());
        hasher.finalize().to_hex().to_string()
    }

    /// Canonical byte encoding, shared by `config_id` and seed derivation.
    pub(crate) fn key_bytes(&self) -> [u8; 25] {
        let mut out = [0u8; 25];
        out[..8].copy_from_slice(&(self.pool_size as u64).to_le_bytes());
        out[8..16].copy_from_slice(&self.explore_fraction.to_bits().to_le_bytes());
        out[16..24].copy_from_slice(&self.k.to_bits().to_le_bytes());
        out[24] = self.rule.tag();
        out
    }
}

/// `floor(n * f)`, the exploration prefix length.
pub fn explore_size(pool_size: usize, fraction: f64) -> usize {
    (pool_size as f64 * fraction).floor() as usize
}

/// `floor(n * k)` clamped to at least one candidate.
pub fn k_count(pool_size: usize, k: f64) -> usize {
    ((pool_size as f64 * k).floor() as usize).max(1)
}

pub(crate) fn validate_percentile(k: f64) -> Result<(), ConfigError> {
    if open_unit_interval(k) {
        Ok(())
    } else {
        Err(ConfigError::PercentileOutOfRange { k })
    }
}

fn open_unit_interval(x: f64) -> bool {
    x.is_finite() && x > 0.0 && x < 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_config() {
        let cfg = TrialConfig::new(100, 0.37, 0.05, SelectionRule::RankBased).unwrap();
        assert_eq!(cfg.explore_size(), 37);
        assert_eq!(cfg.k_count(), 5);
        assert_eq!(cfg.rule(), SelectionRule::RankBased);
    }

    #[test]
    fn rejects_tiny_pool() {
        let err = TrialConfig::new(1, 0.5, 0.1, SelectionRule::BestExplored).unwrap_err();
        assert_eq!(err, ConfigError::PoolTooSmall { pool_size: 1 });
    }

    #[test]
    fn rejects_fraction_outside_open_interval() {
        for f in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            let err = TrialConfig::new(10, f, 0.1, SelectionRule::BestExplored).unwrap_err();
            assert!(matches!(err, ConfigError::FractionOutOfRange { .. }), "f={f}");
        }
    }

    #[test]
    fn rejects_k_outside_open_interval() {
        for k in [0.0, 1.0, 2.0, f64::INFINITY] {
            let err = TrialConfig::new(10, 0.5, k, SelectionRule::TopKThreshold).unwrap_err();
            assert!(matches!(err, ConfigError::PercentileOutOfRange { .. }), "k={k}");
        }
    }

    #[test]
    fn k_count_clamps_to_one() {
        // 10 * 0.01 = 0.1 floors to zero
        let cfg = TrialConfig::new(10, 0.5, 0.01, SelectionRule::BestExplored).unwrap();
        assert_eq!(cfg.k_count(), 1);
    }

    #[test]
    fn small_fraction_gives_empty_prefix() {
        let cfg = TrialConfig::new(5, 0.1, 0.2, SelectionRule::BestExplored).unwrap();
        assert_eq!(cfg.explore_size(), 0);
    }

    #[test]
    fn config_id_is_stable_and_discriminating() {
        let a = TrialConfig::new(100, 0.3, 0.05, SelectionRule::BestExplored).unwrap();
        let b = TrialConfig::new(100, 0.3, 0.05, SelectionRule::RankBased).unwrap();
        assert_eq!(a.config_id(), a.config_id());
        assert_ne!(a.config_id(), b.config_id());
        assert_eq!(a.config_id().len(), 64);
    }

    #[test]
    fn deserialization_validates() {
        let ok: TrialConfig = serde_json::from_str(
            r#"{"pool_size":50,"explore_fraction":0.2,"k":0.1,"rule":"top_k_threshold"}"#,
        )
        .unwrap();
        assert_eq!(ok.pool_size(), 50);

        let bad = serde_json::from_str::<TrialConfig>(
            r#"{"pool_size":50,"explore_fraction":1.2,"k":0.1,"rule":"top_k_threshold"}"#,
        );
        assert!(bad.is_err());
    }
}
