use serde::{Deserialize, Serialize};

use crate::core::constants::{COMBAT_LOG_CAPACITY, DEFAULT_TRAVEL_DURATION_SECONDS};
use crate::error::{CombatError, Result};

/// How a single `update` call treats phase boundaries inside its interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TickPolicy {
    /// One phase per call. At most one monster falls per call and a state
    /// entered mid-call starts consuming time on the next call.
    #[default]
    Stepwise,
    /// The whole interval is consumed, split at every boundary (arrival,
    /// defeat, retreat, full heal). Used for offline catch-up.
    CatchUp,
}

/// Engine tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds spent in `Traveling` before the first fight. 0 skips travel.
    pub travel_duration_seconds: f64,
    pub tick_policy: TickPolicy,
    /// Number of recent log lines kept for polling.
    pub log_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            travel_duration_seconds: DEFAULT_TRAVEL_DURATION_SECONDS,
            tick_policy: TickPolicy::Stepwise,
            log_capacity: COMBAT_LOG_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn with_travel(mut self, seconds: f64) -> Self {
        self.travel_duration_seconds = seconds;
        self
    }

    pub fn with_policy(mut self, policy: TickPolicy) -> Self {
        self.tick_policy = policy;
        self
    }

    /// Catch-up resolution with no travel, for offline progress.
    pub fn catch_up() -> Self {
        Self::default().with_policy(TickPolicy::CatchUp)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.travel_duration_seconds.is_finite() || self.travel_duration_seconds < 0.0 {
            return Err(CombatError::invalid_config(
                "engine",
                format!(
                    "travel duration {} must be a non-negative number of seconds",
                    self.travel_duration_seconds
                ),
            ));
        }
        Ok(())
    }

    pub fn has_travel(&self) -> bool {
        self.travel_duration_seconds > 0.0
    }
}
