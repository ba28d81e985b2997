//! Expedition balance simulator.
//!
//! Runs many seeded expeditions through the real engine to analyze:
//! - How often a tier's queue is cleared versus abandoned
//! - Time spent fighting and recovering
//! - How tick size and tick policy change outcomes

mod config;
pub mod generation;
mod report;
mod runner;
mod scenario;

pub use config::SimConfig;
pub use report::{RunStats, SimReport};
pub use runner::{replay_scenario, run_simulation, ScenarioOutcome};
pub use scenario::Scenario;
