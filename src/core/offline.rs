//! Offline progression.
//!
//! Applies the time the player spent away in one catch-up update, so every
//! defeat, retreat and full heal inside the interval is honored regardless of
//! the engine's configured tick policy.

use super::constants::MAX_OFFLINE_SECONDS;
use crate::combat::{
    CombatEvent, CombatState, EventKind, ExpeditionEngine, TickPolicy, TickResult,
};

/// Report of offline progression results
#[derive(Debug, Default, Clone)]
pub struct OfflineReport {
    pub elapsed_seconds: i64,
    /// Seconds the engine actually simulated, at most the capped elapsed time.
    pub simulated_seconds: f64,
    pub monsters_defeated: u32,
    pub expedition_completed: bool,
    pub state_before: CombatState,
    pub state_after: CombatState,
    pub adventurer_hp: Option<u32>,
    /// Everything raised while catching up, in order.
    pub events: Vec<CombatEvent>,
}

/// Advances `engine` by the time spent offline, capped at
/// [`MAX_OFFLINE_SECONDS`]. Non-positive elapsed time does nothing.
pub fn process_offline_progress(
    engine: &mut ExpeditionEngine,
    elapsed_seconds: i64,
) -> OfflineReport {
    let state_before = engine.state();
    if elapsed_seconds <= 0 {
        return OfflineReport {
            elapsed_seconds,
            state_before,
            state_after: state_before,
            adventurer_hp: engine.adventurer().map(|a| a.current_hp),
            ..Default::default()
        };
    }

    let capped = elapsed_seconds.min(MAX_OFFLINE_SECONDS);
    let previous_policy = engine.config().tick_policy;
    engine.set_tick_policy(TickPolicy::CatchUp);
    let TickResult {
        events,
        seconds_used: simulated_seconds,
    } = engine.advance(capped as f64);
    engine.set_tick_policy(previous_policy);

    let monsters_defeated = events
        .iter()
        .filter(|e| e.kind() == EventKind::MonsterDefeated)
        .count() as u32;
    let expedition_completed = events
        .iter()
        .any(|e| e.kind() == EventKind::ExpeditionCompleted);

    OfflineReport {
        elapsed_seconds,
        simulated_seconds,
        monsters_defeated,
        expedition_completed,
        state_before,
        state_after: engine.state(),
        adventurer_hp: engine.adventurer().map(|a| a.current_hp),
        events,
    }
}
