use serde::{Deserialize, Serialize};

use crate::core::constants::TIME_EPSILON;
use crate::error::{CombatError, Result};
use std::collections::VecDeque;

/// Fixed configuration of a combatant, supplied by whatever builds entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    pub name: String,
    pub max_hp: u32,
    /// Damage dealt per second of sustained combat.
    pub attack_power: u32,
    /// Health fraction below which the entity withdraws. 0 never retreats.
    #[serde(default)]
    pub retreat_threshold: f64,
    /// Health restored per second while not fighting.
    #[serde(default)]
    pub regen_per_second: u32,
}

impl CombatStats {
    pub fn validate(&self) -> Result<()> {
        if self.max_hp == 0 {
            return Err(CombatError::invalid_config(
                &self.name,
                "max health must be positive",
            ));
        }
        if !self.retreat_threshold.is_finite()
            || self.retreat_threshold < 0.0
            || self.retreat_threshold >= 1.0
        {
            return Err(CombatError::invalid_config(
                &self.name,
                format!(
                    "retreat threshold {} is outside [0, 1)",
                    self.retreat_threshold
                ),
            ));
        }
        Ok(())
    }
}

/// Read-only copy of an entity handed to listeners and pollers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub name: String,
    pub current_hp: u32,
    pub max_hp: u32,
    pub attack_power: u32,
    pub retreat_threshold: f64,
    pub regen_per_second: u32,
}

impl EntitySnapshot {
    pub fn health_fraction(&self) -> f64 {
        self.current_hp as f64 / self.max_hp as f64
    }

    pub fn is_defeated(&self) -> bool {
        self.current_hp == 0
    }
}

/// A combatant: immutable stats paired with mutable health.
///
/// Health is clamped to `[0, max_hp]` by every mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombatEntity {
    stats: CombatStats,
    current_hp: u32,
}

impl CombatEntity {
    /// Builds an entity at full health. Fails on non-positive max health or a
    /// retreat threshold outside `[0, 1)`.
    pub fn new(stats: CombatStats) -> Result<Self> {
        stats.validate()?;
        Ok(Self {
            current_hp: stats.max_hp,
            stats,
        })
    }

    pub fn adventurer(
        name: impl Into<String>,
        max_hp: u32,
        attack_power: u32,
        retreat_threshold: f64,
        regen_per_second: u32,
    ) -> Result<Self> {
        Self::new(CombatStats {
            name: name.into(),
            max_hp,
            attack_power,
            retreat_threshold,
            regen_per_second,
        })
    }

    /// Monsters fight to the death and never regenerate.
    pub fn monster(name: impl Into<String>, max_hp: u32, attack_power: u32) -> Result<Self> {
        Self::adventurer(name, max_hp, attack_power, 0.0, 0)
    }

    /// Starts the entity at `hp`, clamped to its max.
    pub fn with_health(mut self, hp: u32) -> Self {
        self.current_hp = hp.min(self.stats.max_hp);
        self
    }

    pub fn name(&self) -> &str {
        &self.stats.name
    }

    pub fn stats(&self) -> &CombatStats {
        &self.stats
    }

    pub fn max_hp(&self) -> u32 {
        self.stats.max_hp
    }

    pub fn current_hp(&self) -> u32 {
        self.current_hp
    }

    pub fn attack_power(&self) -> u32 {
        self.stats.attack_power
    }

    pub fn retreat_threshold(&self) -> f64 {
        self.stats.retreat_threshold
    }

    pub fn regen_per_second(&self) -> u32 {
        self.stats.regen_per_second
    }

    pub fn health_fraction(&self) -> f64 {
        self.current_hp as f64 / self.stats.max_hp as f64
    }

    pub fn is_defeated(&self) -> bool {
        self.current_hp == 0
    }

    pub fn is_full_health(&self) -> bool {
        self.current_hp >= self.stats.max_hp
    }

    /// Health fraction has fallen strictly below the retreat threshold.
    pub fn is_below_retreat_threshold(&self) -> bool {
        (self.current_hp as f64) < self.retreat_limit()
    }

    /// Either below the retreat threshold or out of health entirely.
    pub fn should_withdraw(&self) -> bool {
        self.is_defeated() || self.is_below_retreat_threshold()
    }

    /// Smallest amount of whole-point damage after which [`Self::should_withdraw`]
    /// becomes true.
    pub fn damage_until_withdrawal(&self) -> u32 {
        if self.should_withdraw() {
            return 0;
        }
        let headroom = self.current_hp as f64 - self.retreat_limit();
        let by_threshold = if self.stats.retreat_threshold > 0.0 {
            (headroom.floor() as u32).saturating_add(1)
        } else {
            u32::MAX
        };
        by_threshold.min(self.current_hp)
    }

    /// Subtracts `amount` truncated to whole points, floored at 0.
    /// Zero, negative and NaN amounts are ignored. Returns points removed.
    pub fn take_damage(&mut self, amount: f64) -> u32 {
        let points = whole_points(amount);
        let applied = points.min(self.current_hp);
        self.current_hp -= applied;
        applied
    }

    /// Adds `amount` truncated to whole points, capped at max health.
    /// Returns points restored.
    pub fn heal(&mut self, amount: f64) -> u32 {
        let points = whole_points(amount);
        let applied = points.min(self.stats.max_hp - self.current_hp);
        self.current_hp += applied;
        applied
    }

    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            name: self.stats.name.clone(),
            current_hp: self.current_hp,
            max_hp: self.stats.max_hp,
            attack_power: self.stats.attack_power,
            retreat_threshold: self.stats.retreat_threshold,
            regen_per_second: self.stats.regen_per_second,
        }
    }

    fn retreat_limit(&self) -> f64 {
        self.stats.retreat_threshold * self.stats.max_hp as f64
    }
}

fn whole_points(amount: f64) -> u32 {
    if amount.is_nan() || amount < 1.0 {
        return 0;
    }
    amount.trunc().min(u32::MAX as f64) as u32
}

/// Carries the fractional remainder of per-second rates between ticks so that
/// one long tick and many short ones yield the same whole points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointAccumulator {
    carry: f64,
}

impl PointAccumulator {
    /// Adds `amount` and returns the whole points now ready to apply.
    pub fn add(&mut self, amount: f64) -> f64 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        self.carry += amount;
        let whole = (self.carry + TIME_EPSILON).floor();
        self.carry = (self.carry - whole).max(0.0);
        whole
    }

    /// Raw amount still required before `points` whole points are released.
    pub fn remaining_until(&self, points: u32) -> f64 {
        (points as f64 - self.carry).max(0.0)
    }

    pub fn carry(&self) -> f64 {
        self.carry
    }

    pub fn clear(&mut self) {
        self.carry = 0.0;
    }
}

/// Monsters to be fought front to back. Only ever shrinks from the front.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpeditionQueue {
    monsters: VecDeque<CombatEntity>,
}

impl ExpeditionQueue {
    pub fn new(monsters: impl IntoIterator<Item = CombatEntity>) -> Self {
        Self {
            monsters: monsters.into_iter().collect(),
        }
    }

    pub fn front(&self) -> Option<&CombatEntity> {
        self.monsters.front()
    }

    pub(crate) fn front_mut(&mut self) -> Option<&mut CombatEntity> {
        self.monsters.front_mut()
    }

    pub(crate) fn pop_front(&mut self) -> Option<CombatEntity> {
        self.monsters.pop_front()
    }

    pub fn len(&self) -> usize {
        self.monsters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monsters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CombatEntity> {
        self.monsters.iter()
    }
}

impl FromIterator<CombatEntity> for ExpeditionQueue {
    fn from_iter<I: IntoIterator<Item = CombatEntity>>(iter: I) -> Self {
        Self::new(iter)
    }
}
