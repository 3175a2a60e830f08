//! Trial outcome record.

use serde::{Deserialize, Serialize};

use super::rule::SelectionRule;

/// Result of one simulated trial. Built once by the simulator, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub pool_size: usize,
    pub explore_fraction: f64,
    pub k: f64,
    pub rule: SelectionRule,
    /// Maximum score in the pool.
    pub true_best: f64,
    /// Score at rank `k_count` of the full pool, sorted descending.
    pub k_threshold: f64,
    pub selected: f64,
    /// Arrival position of the selected candidate (0-based).
    pub selected_index: usize,
    /// `1 + count(pool > selected)`; ties at the top all get rank 1.
    pub selected_rank: usize,
    pub is_top_k: bool,
    pub is_best: bool,
    /// `(true_best - selected) / true_best`. Non-finite when `true_best == 0`.
    pub gap_to_best: f64,
    /// `(k_threshold - selected) / k_threshold`. Non-finite when the threshold is 0.
    pub gap_to_k_threshold: f64,
    /// Candidates examined, exploration prefix included.
    pub num_search: usize,
    /// `num_search / pool_size`.
    pub search_time: f64,
    /// No exploitation candidate matched; the last pool element was taken.
    pub fell_back: bool,
}

impl TrialOutcome {
    /// Success under the relaxed objective.
    pub fn is_success(&self) -> bool {
        self.is_top_k
    }
}
