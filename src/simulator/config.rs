//! Simulation configuration.

use crate::combat::{EngineConfig, TickPolicy};
use crate::commands::StatBlock;
use crate::core::constants::{SIM_MAX_TICKS_PER_RUN, TICK_INTERVAL_MS};
use crate::simulator::generation::default_adventurer;

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of simulated expeditions
    pub num_runs: u32,

    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,

    /// Monster tier (1-5)
    pub tier: u32,

    /// Monsters queued per expedition
    pub monsters_per_expedition: u32,

    /// Seconds passed to each update call
    pub tick_seconds: f64,

    /// Maximum update calls per run before timeout
    pub max_ticks_per_run: u64,

    pub tick_policy: TickPolicy,

    pub travel_seconds: f64,

    /// Stat block every run starts from
    pub adventurer: StatBlock,

    /// Log verbosity (0 = silent, 1 = summary, 2 = per run)
    pub verbosity: u8,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_runs: 1000,
            seed: None,
            tier: 1,
            monsters_per_expedition: 5,
            tick_seconds: TICK_INTERVAL_MS as f64 / 1000.0,
            max_ticks_per_run: SIM_MAX_TICKS_PER_RUN,
            tick_policy: TickPolicy::Stepwise,
            travel_seconds: 0.0,
            adventurer: default_adventurer(),
            verbosity: 1,
        }
    }
}

impl SimConfig {
    /// Quick config for testing a single tier
    pub fn tier_balance_test(tier: u32) -> Self {
        Self {
            num_runs: 100,
            tier,
            ..Default::default()
        }
    }

    /// Resolves each expedition in one huge update, as offline progress would
    pub fn offline_catch_up(num_runs: u32) -> Self {
        Self {
            num_runs,
            tick_seconds: 24.0 * 60.0 * 60.0,
            max_ticks_per_run: 1,
            tick_policy: TickPolicy::CatchUp,
            ..Default::default()
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_travel(self.travel_seconds)
            .with_policy(self.tick_policy)
    }
}
