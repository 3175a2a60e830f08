//! Aggregation — pure functions from outcome tables to summary statistics.
//!
//! No dependencies on the sweep scheduler or export formats.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use satisfice_core::stats::mean;
use satisfice_core::{SelectionRule, TrialConfig, TrialOutcome};

/// Summary statistics for one grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub config_id: String,
    pub pool_size: usize,
    pub explore_fraction: f64,
    pub explore_size: usize,
    pub k: f64,
    pub rule: SelectionRule,
    pub trials: usize,
    /// Mean of `is_top_k`.
    pub success_rate: f64,
    /// Binomial standard error of `success_rate`.
    pub success_stderr: f64,
    /// Mean of `is_best`.
    pub best_rate: f64,
    pub mean_rank: f64,
    /// NaN when a trial divided by a zero score. JSON writes it as `null`.
    #[serde(deserialize_with = "nan_from_null")]
    pub mean_gap_to_best: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub mean_gap_to_k_threshold: f64,
    pub mean_num_search: f64,
    pub mean_search_time: f64,
    pub fallback_rate: f64,
}

impl ConfigSummary {
    /// Summarize the outcomes of one configuration.
    ///
    /// Gap means are plain arithmetic means, so a non-finite gap in any trial
    /// carries through to the summary.
    pub fn from_outcomes(config: &TrialConfig, outcomes: &[TrialOutcome]) -> Self {
        let success_rate = rate(outcomes, |o| o.is_top_k);
        let trials = outcomes.len();
        Self {
            config_id: config.config_id(),
            pool_size: config.pool_size(),
            explore_fraction: config.explore_fraction(),
            explore_size: config.explore_size(),
            k: config.k(),
            rule: config.rule(),
            trials,
            success_rate,
            success_stderr: binomial_stderr(success_rate, trials),
            best_rate: rate(outcomes, |o| o.is_best),
            mean_rank: mean_of(outcomes, |o| o.selected_rank as f64),
            mean_gap_to_best: mean_of(outcomes, |o| o.gap_to_best),
            mean_gap_to_k_threshold: mean_of(outcomes, |o| o.gap_to_k_threshold),
            mean_num_search: mean_of(outcomes, |o| o.num_search as f64),
            mean_search_time: mean_of(outcomes, |o| o.search_time),
            fallback_rate: rate(outcomes, |o| o.fell_back),
        }
    }
}

/// Best exploration fraction for one `(pool_size, k, rule)` slice of the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalFraction {
    pub pool_size: usize,
    pub k: f64,
    pub rule: SelectionRule,
    pub explore_fraction: f64,
    pub success_rate: f64,
    pub mean_search_time: f64,
}

/// For each `(pool_size, k, rule)`, the fraction with the highest success
/// rate. Ties go to the smaller fraction (less exploration for the same
/// success). Ordered by pool size, then k, then rule.
pub fn optimal_fractions(summaries: &[ConfigSummary]) -> Vec<OptimalFraction> {
    let mut best: BTreeMap<(usize, u64, SelectionRule), &ConfigSummary> = BTreeMap::new();

    for s in summaries {
        // k is positive, so its bit pattern orders like the value.
        let key = (s.pool_size, s.k.to_bits(), s.rule);
        best.entry(key)
            .and_modify(|current| {
                let better = s.success_rate > current.success_rate
                    || (s.success_rate == current.success_rate
                        && s.explore_fraction < current.explore_fraction);
                if better {
                    *current = s;
                }
            })
            .or_insert(s);
    }

    best.into_values()
        .map(|s| OptimalFraction {
            pool_size: s.pool_size,
            k: s.k,
            rule: s.rule,
            explore_fraction: s.explore_fraction,
            success_rate: s.success_rate,
            mean_search_time: s.mean_search_time,
        })
        .collect()
}

/// Success rate surface for one `(pool_size, k)`: rows are fractions in
/// ascending order, columns follow `rules`. Missing cells are `None`.
pub fn success_surface(
    summaries: &[ConfigSummary],
    pool_size: usize,
    k: f64,
    rules: &[SelectionRule],
) -> Vec<(f64, Vec<Option<f64>>)> {
    let mut rows: BTreeMap<u64, Vec<Option<f64>>> = BTreeMap::new();
    for s in summaries
        .iter()
        .filter(|s| s.pool_size == pool_size && s.k == k)
    {
        let row = rows
            .entry(s.explore_fraction.to_bits())
            .or_insert_with(|| vec![None; rules.len()]);
        if let Some(col) = rules.iter().position(|&r| r == s.rule) {
            row[col] = Some(s.success_rate);
        }
    }
    rows.into_iter()
        .map(|(bits, row)| (f64::from_bits(bits), row))
        .collect()
}

fn rate(outcomes: &[TrialOutcome], pred: impl Fn(&TrialOutcome) -> bool) -> f64 {
    if outcomes.is_empty() {
        return 0.0;
    }
    outcomes.iter().filter(|o| pred(*o)).count() as f64 / outcomes.len() as f64
}

fn mean_of(outcomes: &[TrialOutcome], field: impl Fn(&TrialOutcome) -> f64) -> f64 {
    let values: Vec<f64> = outcomes.iter().map(field).collect();
    mean(&values)
}

/// Reads `null` back as NaN, the inverse of how serde_json writes non-finite floats.
fn nan_from_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// `sqrt(p (1 - p) / n)`; zero for an empty sample.
pub fn binomial_stderr(p: f64, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    (p * (1.0 - p) / n as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use satisfice_core::select_from_pool;

    fn summary(n: usize, f: f64, k: f64, rule: SelectionRule, success: f64) -> ConfigSummary {
        let cfg = TrialConfig::new(n, f, k, rule).unwrap();
        let mut s = ConfigSummary::from_outcomes(&cfg, &[]);
        s.success_rate = success;
        s
    }

    #[test]
    fn summary_of_known_outcomes() {
        let cfg = TrialConfig::new(5, 0.4, 0.2, SelectionRule::BestExplored).unwrap();
        let hit = select_from_pool(&[0.9, 0.2, 0.5, 0.95, 0.1], 2, 0.2, cfg.rule()).unwrap();
        let miss = select_from_pool(&[0.99, 0.2, 0.5, 0.95, 0.1], 2, 0.2, cfg.rule()).unwrap();
        let s = ConfigSummary::from_outcomes(&cfg, &[hit, miss]);

        assert_eq!(s.trials, 2);
        assert_eq!(s.success_rate, 0.5);
        assert_eq!(s.best_rate, 0.5);
        assert_eq!(s.fallback_rate, 0.5);
        // hit: rank 1, 4 examined; miss: fallback 0.1, rank 5, 5 examined
        assert_eq!(s.mean_rank, 3.0);
        assert_eq!(s.mean_num_search, 4.5);
        assert!((s.mean_search_time - 0.9).abs() < 1e-12);
        assert!((s.success_stderr - 0.5_f64.sqrt() / 2.0).abs() < 1e-12);
        assert_eq!(s.explore_size, 2);
    }

    #[test]
    fn empty_outcomes_give_zeroes() {
        let cfg = TrialConfig::new(10, 0.3, 0.1, SelectionRule::RankBased).unwrap();
        let s = ConfigSummary::from_outcomes(&cfg, &[]);
        assert_eq!(s.trials, 0);
        assert_eq!(s.success_rate, 0.0);
        assert_eq!(s.success_stderr, 0.0);
    }

    #[test]
    fn non_finite_gap_propagates() {
        let cfg = TrialConfig::new(2, 0.5, 0.5, SelectionRule::BestExplored).unwrap();
        let zero = select_from_pool(&[0.0, 0.0], 1, 0.5, cfg.rule()).unwrap();
        let s = ConfigSummary::from_outcomes(&cfg, &[zero]);
        assert!(s.mean_gap_to_best.is_nan());
    }

    #[test]
    fn optimal_fraction_picks_highest_success() {
        let rule = SelectionRule::BestExplored;
        let summaries = vec![
            summary(100, 0.2, 0.05, rule, 0.40),
            summary(100, 0.3, 0.05, rule, 0.55),
            summary(100, 0.5, 0.05, rule, 0.50),
            summary(100, 0.3, 0.10, rule, 0.60),
        ];
        let best = optimal_fractions(&summaries);
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].k, 0.05);
        assert_eq!(best[0].explore_fraction, 0.3);
        assert_eq!(best[0].success_rate, 0.55);
        assert_eq!(best[1].k, 0.10);
    }

    #[test]
    fn optimal_fraction_tie_prefers_less_exploration() {
        let rule = SelectionRule::RankBased;
        let summaries = vec![
            summary(50, 0.6, 0.1, rule, 0.7),
            summary(50, 0.2, 0.1, rule, 0.7),
        ];
        let best = optimal_fractions(&summaries);
        assert_eq!(best[0].explore_fraction, 0.2);
    }

    #[test]
    fn surface_rows_and_columns() {
        let rules = [SelectionRule::BestExplored, SelectionRule::RankBased];
        let summaries = vec![
            summary(100, 0.5, 0.05, SelectionRule::RankBased, 0.3),
            summary(100, 0.2, 0.05, SelectionRule::BestExplored, 0.1),
            summary(100, 0.2, 0.05, SelectionRule::RankBased, 0.2),
            summary(500, 0.2, 0.05, SelectionRule::RankBased, 0.9),
        ];
        let surface = success_surface(&summaries, 100, 0.05, &rules);
        assert_eq!(surface.len(), 2);
        assert_eq!(surface[0], (0.2, vec![Some(0.1), Some(0.2)]));
        assert_eq!(surface[1], (0.5, vec![None, Some(0.3)]));
    }
}
