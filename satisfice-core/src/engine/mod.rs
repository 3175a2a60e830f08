pub mod stopping;
pub mod trial;

pub use stopping::{find_stop, StopDecision};
pub use trial::{draw_pool, run_trial, select_from_pool, simulate_trial};
