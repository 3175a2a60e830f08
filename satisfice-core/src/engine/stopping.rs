//! Stopping-rule evaluation for the exploitation phase.
//!
//! One entry point, [`find_stop`], dispatches on [`SelectionRule`] with an
//! exhaustive match. The exploration prefix only calibrates; the first
//! exploitation candidate that satisfies the rule is taken.

use crate::domain::SelectionRule;
use crate::stats::{max_score, quantile_linear};

/// Where the exploitation scan stopped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopDecision {
    /// Pool index of the accepted candidate, `None` if nothing matched.
    pub index: Option<usize>,
    /// Candidates examined, exploration prefix included.
    pub examined: usize,
    /// Acceptance threshold derived from the prefix. `None` for the
    /// rank-based rule and for an empty prefix.
    pub calibration: Option<f64>,
}

/// Scan `pool[explore_size..]` in arrival order and stop at the first
/// candidate accepted by `rule`.
///
/// Callers guarantee `explore_size <= pool.len()`.
pub fn find_stop(pool: &[f64], explore_size: usize, k: f64, rule: SelectionRule) -> StopDecision {
    let (prefix, suffix) = pool.split_at(explore_size);
    match rule {
        SelectionRule::BestExplored => threshold_scan(max_score(prefix), suffix, explore_size),
        SelectionRule::TopKThreshold => {
            threshold_scan(quantile_linear(prefix, 1.0 - k), suffix, explore_size)
        }
        SelectionRule::RankBased => rank_scan(prefix, suffix, k),
    }
}

/// Accept the first suffix score `>= threshold`. An uncalibrated rule
/// (empty prefix) never accepts and examines the whole suffix.
fn threshold_scan(threshold: Option<f64>, suffix: &[f64], offset: usize) -> StopDecision {
    let Some(t) = threshold else {
        return StopDecision {
            index: None,
            examined: offset + suffix.len(),
            calibration: None,
        };
    };
    match suffix.iter().position(|&x| x >= t) {
        Some(pos) => StopDecision {
            index: Some(offset + pos),
            examined: offset + pos + 1,
            calibration: Some(t),
        },
        None => StopDecision {
            index: None,
            examined: offset + suffix.len(),
            calibration: Some(t),
        },
    }
}

/// Accept the first candidate whose rank among everything seen so far is
/// within `max(floor(|seen| * k), 1)`.
///
/// Equal scores that arrived earlier outrank the newcomer.
fn rank_scan(prefix: &[f64], suffix: &[f64], k: f64) -> StopDecision {
    let offset = prefix.len();
    let mut seen: Vec<f64> = Vec::with_capacity(prefix.len() + suffix.len());
    seen.extend_from_slice(prefix);

    for (pos, &x) in suffix.iter().enumerate() {
        let rank = 1 + seen.iter().filter(|&&v| v >= x).count();
        seen.push(x);
        let k_seen = ((seen.len() as f64 * k).floor() as usize).max(1);
        if rank <= k_seen {
            return StopDecision {
                index: Some(offset + pos),
                examined: offset + pos + 1,
                calibration: None,
            };
        }
    }

    StopDecision {
        index: None,
        examined: offset + suffix.len(),
        calibration: None,
    }
}
