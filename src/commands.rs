//! Command layer between callers (UI, scripts, scenario files) and the
//! engine. Converts raw stat blocks into validated entities and routes each
//! command to the matching engine operation. Holds no combat logic.

use serde::{Deserialize, Serialize};

use crate::combat::{
    CombatEntity, CombatEvent, CombatState, CombatStats, EntitySnapshot, ExpeditionEngine,
};
use crate::error::{CombatError, Result};

/// Stat block as supplied by data files. Signed so out-of-range values reach
/// validation instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    pub name: String,
    pub max_health: i64,
    pub attack_power: i64,
    #[serde(default)]
    pub retreat_threshold: f64,
    #[serde(default)]
    pub regen_per_second: i64,
    /// Starting health; defaults to max.
    #[serde(default)]
    pub current_health: Option<i64>,
}

impl StatBlock {
    pub fn new(name: impl Into<String>, max_health: i64, attack_power: i64) -> Self {
        Self {
            name: name.into(),
            max_health,
            attack_power,
            retreat_threshold: 0.0,
            regen_per_second: 0,
            current_health: None,
        }
    }

    pub fn with_retreat(mut self, threshold: f64) -> Self {
        self.retreat_threshold = threshold;
        self
    }

    pub fn with_regen(mut self, per_second: i64) -> Self {
        self.regen_per_second = per_second;
        self
    }

    pub fn with_current_health(mut self, hp: i64) -> Self {
        self.current_health = Some(hp);
        self
    }

    /// Validates the block and builds an entity.
    pub fn build(&self) -> Result<CombatEntity> {
        if self.max_health <= 0 {
            return Err(CombatError::invalid_config(
                &self.name,
                "max health must be positive",
            ));
        }
        let stats = CombatStats {
            name: self.name.clone(),
            max_hp: to_points(&self.name, "max health", self.max_health)?,
            attack_power: to_points(&self.name, "attack power", self.attack_power)?,
            retreat_threshold: self.retreat_threshold,
            regen_per_second: to_points(&self.name, "regen per second", self.regen_per_second)?,
        };
        let entity = CombatEntity::new(stats)?;
        Ok(match self.current_health {
            Some(hp) => {
                let clamped = hp.clamp(0, entity.max_hp() as i64) as u32;
                entity.with_health(clamped)
            }
            None => entity,
        })
    }
}

fn to_points(name: &str, field: &str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        CombatError::invalid_config(name, format!("{field} {value} is out of range"))
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpeditionRequest {
    pub adventurer: Option<StatBlock>,
    #[serde(default)]
    pub monsters: Vec<StatBlock>,
}

impl ExpeditionRequest {
    pub fn new(adventurer: StatBlock, monsters: Vec<StatBlock>) -> Self {
        Self {
            adventurer: Some(adventurer),
            monsters,
        }
    }

    /// Builds every entity up front so a bad block never leaves a partial
    /// session behind.
    pub fn build(&self) -> Result<(CombatEntity, Vec<CombatEntity>)> {
        let adventurer = self
            .adventurer
            .as_ref()
            .ok_or(CombatError::MissingStatBlock("adventurer"))?
            .build()?;
        let monsters = self
            .monsters
            .iter()
            .map(StatBlock::build)
            .collect::<Result<Vec<_>>>()?;
        Ok((adventurer, monsters))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    StartExpedition(ExpeditionRequest),
    AdvanceTime(f64),
    ForceRetreat,
    Reset,
}

/// Runs `command` against `engine` and returns the events it raised.
pub fn execute(engine: &mut ExpeditionEngine, command: Command) -> Result<Vec<CombatEvent>> {
    match command {
        Command::StartExpedition(request) => {
            let (adventurer, monsters) = request.build()?;
            engine.start_expedition(adventurer, monsters)
        }
        Command::AdvanceTime(seconds) => Ok(engine.update(seconds)),
        Command::ForceRetreat => Ok(engine.force_retreat()),
        Command::Reset => Ok(engine.reset()),
    }
}

/// Everything a poller needs in one read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpeditionStatus {
    pub state: CombatState,
    pub adventurer: Option<EntitySnapshot>,
    pub current_monster: Option<EntitySnapshot>,
    pub monsters_remaining: usize,
    pub monsters_defeated: u32,
    pub in_combat: bool,
}

pub fn status(engine: &ExpeditionEngine) -> ExpeditionStatus {
    ExpeditionStatus {
        state: engine.state(),
        adventurer: engine.adventurer(),
        current_monster: engine.current_monster(),
        monsters_remaining: engine.remaining_monsters(),
        monsters_defeated: engine.monsters_defeated(),
        in_combat: engine.is_in_combat(),
    }
}
