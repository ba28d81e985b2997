//! Expedition states and the transition table that connects them.
//!
//! Every legal move of the state machine is listed in [`transition`]; the
//! engine never changes state without going through it.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CombatState {
    /// No adventurer committed; waiting to be dispatched.
    #[default]
    Idle,
    /// En route to the dungeon. No combat.
    Traveling,
    /// Exchanging damage with the front monster of the queue.
    Fighting,
    /// Withdrawing after health fell below the retreat threshold.
    Retreating,
    /// Recovering after clearing the queue.
    Regenerating,
}

impl CombatState {
    pub fn all() -> [CombatState; 5] {
        [
            CombatState::Idle,
            CombatState::Traveling,
            CombatState::Fighting,
            CombatState::Retreating,
            CombatState::Regenerating,
        ]
    }

    pub fn is_in_combat(self) -> bool {
        self == CombatState::Fighting
    }

    /// States in which the adventurer heals over time.
    pub fn is_recovering(self) -> bool {
        matches!(self, CombatState::Retreating | CombatState::Regenerating)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CombatState::Idle => "Idle",
            CombatState::Traveling => "Traveling",
            CombatState::Fighting => "Fighting",
            CombatState::Retreating => "Retreating",
            CombatState::Regenerating => "Regenerating",
        }
    }
}

impl fmt::Display for CombatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that can move the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A new expedition was started.
    Dispatch { travel: bool, has_monsters: bool },
    /// Travel time elapsed.
    ArrivedAtDungeon,
    /// The last monster in the queue was defeated.
    QueueCleared,
    /// Adventurer health dropped below its threshold (or to zero).
    ThresholdCrossed,
    /// External recall.
    ForcedRetreat,
    /// Adventurer reached max health while recovering.
    FullyHealed,
    /// Hard reset of the session.
    Reset,
}

/// Result of a legal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: CombatState,
    /// The expedition ended with this transition.
    pub completes_expedition: bool,
}

impl Transition {
    const fn to(next: CombatState) -> Self {
        Self {
            next,
            completes_expedition: false,
        }
    }

    const fn completing(next: CombatState) -> Self {
        Self {
            next,
            completes_expedition: true,
        }
    }
}

/// Looks up `(from, trigger)` in the transition table.
/// Returns `None` when the trigger has no effect in that state.
pub fn transition(from: CombatState, trigger: Trigger) -> Option<Transition> {
    use CombatState::*;

    match (from, trigger) {
        // A dispatch replaces whatever session was running
        (_, Trigger::Dispatch {
            has_monsters: false,
            ..
        }) => Some(Transition::completing(Regenerating)),
        (_, Trigger::Dispatch { travel: true, .. }) => Some(Transition::to(Traveling)),
        (_, Trigger::Dispatch { travel: false, .. }) => Some(Transition::to(Fighting)),

        (Traveling, Trigger::ArrivedAtDungeon) => Some(Transition::to(Fighting)),

        (Fighting, Trigger::QueueCleared) => Some(Transition::completing(Regenerating)),
        (Fighting, Trigger::ThresholdCrossed) => Some(Transition::completing(Retreating)),
        (Fighting, Trigger::ForcedRetreat) => Some(Transition::completing(Retreating)),

        (Retreating | Regenerating, Trigger::FullyHealed) => Some(Transition::to(Idle)),

        (_, Trigger::Reset) => Some(Transition::to(Idle)),

        _ => None,
    }
}
