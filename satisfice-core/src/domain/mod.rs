pub mod config;
pub mod outcome;
pub mod rule;

pub use config::{explore_size, k_count, ConfigError, TrialConfig, MIN_POOL_SIZE};
pub use outcome::TrialOutcome;
pub use rule::{ParseRuleError, SelectionRule};
