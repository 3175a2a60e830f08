//! Selection rules applied during the exploitation phase.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Stopping rule used to pick a candidate after the exploration prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionRule {
    /// Accept the first candidate at least as good as the best explored one.
    BestExplored,
    /// Accept the first candidate above the `(1-k)`-quantile of the prefix.
    TopKThreshold,
    /// Accept the first candidate ranked in the top-k% of everything seen so far.
    RankBased,
}

impl SelectionRule {
    /// All rules, in canonical order.
    pub const ALL: [SelectionRule; 3] = [
        SelectionRule::BestExplored,
        SelectionRule::TopKThreshold,
        SelectionRule::RankBased,
    ];

    /// Stable snake_case name, used in CSV columns and config files.
    pub fn name(&self) -> &'static str {
        match self {
            SelectionRule::BestExplored => "best_explored",
            SelectionRule::TopKThreshold => "top_k_threshold",
            SelectionRule::RankBased => "rank_based",
        }
    }

    /// Single-byte tag folded into seed derivation.
    pub(crate) fn tag(&self) -> u8 {
        match self {
            SelectionRule::BestExplored => 0,
            SelectionRule::TopKThreshold => 1,
            SelectionRule::RankBased => 2,
        }
    }

    /// Whether the rule needs a non-empty exploration prefix to calibrate.
    pub fn needs_prefix(&self) -> bool {
        match self {
            SelectionRule::BestExplored | SelectionRule::TopKThreshold => true,
            SelectionRule::RankBased => false,
        }
    }
}

impl fmt::Display for SelectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown rule name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown selection rule '{0}' (expected best_explored, top_k_threshold or rank_based)")]
pub struct ParseRuleError(pub String);

impl FromStr for SelectionRule {
    type Err = ParseRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "best_explored" | "best" => Ok(SelectionRule::BestExplored),
            "top_k_threshold" | "threshold" => Ok(SelectionRule::TopKThreshold),
            "rank_based" | "rank" => Ok(SelectionRule::RankBased),
            _ => Err(ParseRuleError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_snake_and_kebab_case() {
        assert_eq!(
            "top-k-threshold".parse::<SelectionRule>().unwrap(),
            SelectionRule::TopKThreshold
        );
        assert_eq!(
            "RANK_BASED".parse::<SelectionRule>().unwrap(),
            SelectionRule::RankBased
        );
        assert_eq!(
            "best".parse::<SelectionRule>().unwrap(),
            SelectionRule::BestExplored
        );
    }

    #[test]
    fn rejects_unknown_name() {
        let err = "secretary".parse::<SelectionRule>().unwrap_err();
        assert!(err.to_string().contains("secretary"));
    }

    #[test]
    fn display_matches_serde_name() {
        for rule in SelectionRule::ALL {
            let json = serde_json::to_string(&rule).unwrap();
            assert_eq!(json, format!("\"{rule}\""));
        }
    }

    #[test]
    fn tags_are_distinct() {
        let tags: Vec<u8> = SelectionRule::ALL.iter().map(|r| r.tag()).collect();
        assert_eq!(tags, vec![0, 1, 2]);
    }
}
