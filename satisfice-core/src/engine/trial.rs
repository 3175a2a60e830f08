//! Trial simulator: draw a pool, run the stopping rule, score the pick.

use rand::Rng;

use crate::domain::config::validate_percentile;
use crate::domain::{k_count, ConfigError, SelectionRule, TrialConfig, TrialOutcome};
use crate::engine::stopping::find_stop;
use crate::stats::{descending_rank, max_score, true_k_threshold};

/// Draw `pool_size` i.i.d. uniform [0, 1) scores in arrival order.
pub fn draw_pool<R: Rng + ?Sized>(pool_size: usize, rng: &mut R) -> Vec<f64> {
    (0..pool_size).map(|_| rng.gen::<f64>()).collect()
}

/// Run one trial for a validated configuration.
///
/// Reads only from `rng`; the same seed and config always give the same outcome.
pub fn simulate_trial<R: Rng + ?Sized>(config: &TrialConfig, rng: &mut R) -> TrialOutcome {
    let pool = draw_pool(config.pool_size(), rng);
    outcome_for(
        &pool,
        config.explore_size(),
        config.explore_fraction(),
        config.k(),
        config.rule(),
    )
}

/// Validate raw parameters, then run one trial.
///
/// Invalid input is rejected before any draw from `rng`.
pub fn run_trial<R: Rng + ?Sized>(
    pool_size: usize,
    explore_fraction: f64,
    k: f64,
    rule: SelectionRule,
    rng: &mut R,
) -> Result<TrialOutcome, ConfigError> {
    let config = TrialConfig::new(pool_size, explore_fraction, k, rule)?;
    Ok(simulate_trial(&config, rng))
}

/// Apply `rule` to a caller-supplied pool with an explicit prefix length.
///
/// Accepts any `explore_size` in `[0, pool.len()]`, including the degenerate
/// ends a validated fraction cannot reach. The recorded `explore_fraction`
/// is `explore_size / pool.len()`.
pub fn select_from_pool(
    pool: &[f64],
    explore_size: usize,
    k: f64,
    rule: SelectionRule,
) -> Result<TrialOutcome, ConfigError> {
    if pool.is_empty() {
        return Err(ConfigError::EmptyPool);
    }
    if explore_size > pool.len() {
        return Err(ConfigError::ExploreSizeExceedsPool {
            explore_size,
            pool_size: pool.len(),
        });
    }
    validate_percentile(k)?;
    let fraction = explore_size as f64 / pool.len() as f64;
    Ok(outcome_for(pool, explore_size, fraction, k, rule))
}

/// Score one pool. `pool` is non-empty and `explore_size <= pool.len()`.
fn outcome_for(
    pool: &[f64],
    explore_size: usize,
    explore_fraction: f64,
    k: f64,
    rule: SelectionRule,
) -> TrialOutcome {
    let n = pool.len();

    // Both are Some for a non-empty pool.
    let true_best = max_score(pool).unwrap_or(f64::NAN);
    let k_threshold = true_k_threshold(pool, k_count(n, k)).unwrap_or(f64::NAN);

    let stop = find_stop(pool, explore_size, k, rule);
    let fell_back = stop.index.is_none();
    let selected_index = stop.index.unwrap_or(n - 1);
    let selected = pool[selected_index];

    TrialOutcome {
        pool_size: n,
        explore_fraction,
        k,
        rule,
        true_best,
        k_threshold,
        selected,
        selected_index,
        selected_rank: descending_rank(pool, selected),
        is_top_k: selected >= k_threshold,
        is_best: selected == true_best,
        gap_to_best: (true_best - selected) / true_best,
        gap_to_k_threshold: (k_threshold - selected) / k_threshold,
        num_search: stop.examined,
        search_time: stop.examined as f64 / n as f64,
        fell_back,
    }
}
