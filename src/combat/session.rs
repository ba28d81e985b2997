use super::types::{CombatEntity, ExpeditionQueue, PointAccumulator};

/// The one active expedition: adventurer, remaining monsters and the
/// bookkeeping needed to advance them. Replaced wholesale on every dispatch.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) adventurer: CombatEntity,
    pub(crate) queue: ExpeditionQueue,
    pub(crate) travel_remaining: f64,
    /// Fractional damage owed to the front monster.
    pub(crate) monster_damage: PointAccumulator,
    /// Fractional damage owed to the adventurer.
    pub(crate) adventurer_damage: PointAccumulator,
    pub(crate) regen: PointAccumulator,
    pub(crate) monsters_defeated: u32,
}

impl Session {
    pub fn new(adventurer: CombatEntity, queue: ExpeditionQueue, travel_seconds: f64) -> Self {
        Self {
            adventurer,
            queue,
            travel_remaining: travel_seconds,
            monster_damage: PointAccumulator::default(),
            adventurer_damage: PointAccumulator::default(),
            regen: PointAccumulator::default(),
            monsters_defeated: 0,
        }
    }

    pub fn adventurer(&self) -> &CombatEntity {
        &self.adventurer
    }

    pub fn queue(&self) -> &ExpeditionQueue {
        &self.queue
    }

    pub fn monsters_defeated(&self) -> u32 {
        self.monsters_defeated
    }

    pub fn travel_remaining(&self) -> f64 {
        self.travel_remaining
    }

    /// Drops partial damage when a fight starts or stops.
    pub(crate) fn clear_fight_carry(&mut self) {
        self.monster_damage.clear();
        self.adventurer_damage.clear();
    }
}
