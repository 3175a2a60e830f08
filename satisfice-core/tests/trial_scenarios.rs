//! Concrete trial scenarios used as regression baselines.
//!
//! Pool `[0.9, 0.2, 0.5, 0.95, 0.1]` in arrival order, exploration prefix of
//! two candidates (`f = 0.4`).

use rand::rngs::StdRng;
use rand::SeedableRng;
use satisfice_core::engine::find_stop;
use satisfice_core::{
    run_trial, select_from_pool, simulate_trial, ConfigError, RngHierarchy, SelectionRule,
    TrialConfig,
};

const POOL: [f64; 5] = [0.9, 0.2, 0.5, 0.95, 0.1];

#[test]
fn scenario_best_explored_finds_true_best() {
    // GIVEN prefix [0.9, 0.2] and suffix [0.5, 0.95, 0.1]
    // WHEN the best-explored rule runs
    let out = select_from_pool(&POOL, 2, 0.2, SelectionRule::BestExplored).unwrap();

    // THEN the first candidate >= 0.9 is 0.95, the fourth examined
    assert_eq!(out.selected, 0.95);
    assert_eq!(out.num_search, 4);
    assert_eq!(out.selected_rank, 1);
    assert_eq!(out.search_time, 0.8);
    assert!(out.is_best);
}

#[test]
fn scenario_top_k_threshold_regression_baseline() {
    // GIVEN k = 0.2, the estimated threshold is the 0.8-quantile of [0.9, 0.2]:
    // h = (2 - 1) * 0.8 = 0.8 -> 0.2 + 0.8 * (0.9 - 0.2) = 0.76
    let stop = find_stop(&POOL, 2, 0.2, SelectionRule::TopKThreshold);
    let estimated = stop.calibration.expect("prefix is non-empty");
    assert!((estimated - 0.76).abs() < 1e-12, "estimated threshold {estimated}");

    // THEN 0.5 is rejected and 0.95 accepted
    let out = select_from_pool(&POOL, 2, 0.2, SelectionRule::TopKThreshold).unwrap();
    assert_eq!(out.selected, 0.95);
    assert_eq!(out.num_search, 4);
    assert_eq!(out.selected_rank, 1);

    // AND the true threshold (k_count = floor(5 * 0.2) = 1) is the pool max
    assert_eq!(out.k_threshold, 0.95);
    assert!(out.is_top_k);
}

#[test]
fn scenario_rank_based_on_same_pool() {
    // k = 0.2: k_seen stays 1 for |seen| < 10, so only a new running best passes
    let out = select_from_pool(&POOL, 2, 0.2, SelectionRule::RankBased).unwrap();
    assert_eq!(out.selected, 0.95);
    assert_eq!(out.num_search, 4);
}

#[test]
fn boundary_empty_prefix_scans_whole_pool() {
    // f = 0.1 on five candidates -> explore_size = floor(0.5) = 0
    let cfg = TrialConfig::new(5, 0.1, 0.2, SelectionRule::BestExplored).unwrap();
    assert_eq!(cfg.explore_size(), 0);

    for rule in [SelectionRule::BestExplored, SelectionRule::TopKThreshold] {
        let out = select_from_pool(&POOL, 0, 0.2, rule).unwrap();
        assert_eq!(out.num_search, 5, "{rule}");
        assert_eq!(out.selected, 0.1, "{rule}");
        assert!(out.fell_back, "{rule}");
        assert_eq!(out.search_time, 1.0, "{rule}");
    }
}

#[test]
fn boundary_full_prefix_keeps_fallback() {
    for rule in SelectionRule::ALL {
        let out = select_from_pool(&POOL, POOL.len(), 0.2, rule).unwrap();
        assert_eq!(out.selected, 0.1, "{rule}");
        assert_eq!(out.selected_index, 4, "{rule}");
        assert_eq!(out.num_search, 5, "{rule}");
        assert_eq!(out.selected_rank, 5, "{rule}");
        assert_eq!(out.explore_fraction, 1.0, "{rule}");
        assert!(out.fell_back, "{rule}");
    }
}

#[test]
fn invalid_configs_fail_fast() {
    let mut rng = StdRng::seed_from_u64(1);
    assert!(matches!(
        run_trial(1, 0.3, 0.1, SelectionRule::RankBased, &mut rng),
        Err(ConfigError::PoolTooSmall { pool_size: 1 })
    ));
    assert!(matches!(
        run_trial(10, 0.0, 0.1, SelectionRule::RankBased, &mut rng),
        Err(ConfigError::FractionOutOfRange { .. })
    ));
    assert!(matches!(
        run_trial(10, 0.3, 1.0, SelectionRule::RankBased, &mut rng),
        Err(ConfigError::PercentileOutOfRange { .. })
    ));
}

#[test]
fn fixed_seed_reproduces_outcomes() {
    let hierarchy = RngHierarchy::new(2024);
    for rule in SelectionRule::ALL {
        let cfg = TrialConfig::new(500, 0.37, 0.05, rule).unwrap();
        for trial in 0..20 {
            let first = simulate_trial(&cfg, &mut hierarchy.rng_for(&cfg, trial));
            let second = simulate_trial(&cfg, &mut hierarchy.rng_for(&cfg, trial));
            assert_eq!(first, second);
        }
    }
}
