//! Scripted expeditions loaded from JSON.
//!
//! ```json
//! {
//!   "engine": { "travel_duration_seconds": 2.0 },
//!   "adventurer": { "name": "Hero", "max_health": 100, "attack_power": 10, "retreat_threshold": 0.25 },
//!   "monsters": [ { "name": "Goblin", "max_health": 20, "attack_power": 5 } ],
//!   "ticks": [1.0, 1.0, 2.0],
//!   "force_retreat_after": 1
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::combat::EngineConfig;
use crate::commands::ExpeditionRequest;
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(flatten)]
    pub expedition: ExpeditionRequest,
    /// Seconds passed to each successive update.
    #[serde(default)]
    pub ticks: Vec<f64>,
    /// Recall the adventurer right after this tick index.
    #[serde(default)]
    pub force_retreat_after: Option<usize>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn total_seconds(&self) -> f64 {
        self.ticks.iter().filter(|t| **t > 0.0).sum()
    }
}
