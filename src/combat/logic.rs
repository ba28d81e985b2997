//! Expedition engine: owns the single active session and advances it by
//! caller-supplied time.
//!
//! Each `update` resolves in a fixed order:
//! 1. `Fighting`: both sides deal `attack_power * dt` simultaneously.
//! 2. Monster defeat: dequeue, publish `MonsterDefeated`; an empty queue ends
//!    the expedition in `Regenerating`.
//! 3. Adventurer withdrawal: health strictly below the retreat threshold (or
//!    zero) moves to `Retreating`.
//! 4. `Retreating` / `Regenerating`: heal `regen_per_second * dt`, `Idle` once
//!    full.
//! 5. `Traveling`: switch to `Fighting` once the travel time is used up.
//!
//! Only the phase the engine was in when the call started is resolved under
//! [`TickPolicy::Stepwise`]. [`TickPolicy::CatchUp`] keeps going across phase
//! boundaries until the interval is spent.

use super::config::{EngineConfig, TickPolicy};
use super::events::{CombatEvent, EventKind, Notifier, SubscriptionId};
use super::session::Session;
use super::state::{transition, CombatState, Trigger};
use super::types::{CombatEntity, EntitySnapshot, ExpeditionQueue};
use crate::core::constants::{MAX_STALLED_CATCH_UP_STEPS, TIME_EPSILON};
use crate::error::{CombatError, Result};
use std::collections::VecDeque;

/// What one exchange of blows did to the session.
struct FightOutcome {
    defeated: Option<EntitySnapshot>,
    next_monster: Option<String>,
    adventurer: String,
    withdraw: bool,
    adventurer_down: bool,
}

/// Applies one simultaneous exchange and dequeues the front monster if it fell.
fn exchange_blows(session: &mut Session, dt: f64) -> FightOutcome {
    let adventurer_attack = session.adventurer.attack_power() as f64;
    let mut defeated = None;

    if let Some(monster) = session.queue.front_mut() {
        let to_monster = session.monster_damage.add(adventurer_attack * dt);
        let to_adventurer = session
            .adventurer_damage
            .add(monster.attack_power() as f64 * dt);
        monster.take_damage(to_monster);
        session.adventurer.take_damage(to_adventurer);

        if monster.is_defeated() {
            defeated = session.queue.pop_front().map(|m| m.snapshot());
            session.monsters_defeated += 1;
            session.monster_damage.clear();
        }
    }

    FightOutcome {
        defeated,
        next_monster: session.queue.front().map(|m| m.name().to_string()),
        adventurer: session.adventurer.name().to_string(),
        withdraw: session.adventurer.should_withdraw(),
        adventurer_down: session.adventurer.is_defeated(),
    }
}

/// Seconds needed to accumulate `amount` at `rate` per second.
fn time_at_rate(amount: f64, rate: u32) -> Option<f64> {
    (rate > 0).then(|| amount / rate as f64)
}

/// Everything one [`ExpeditionEngine::advance`] call produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickResult {
    pub events: Vec<CombatEvent>,
    /// Seconds of the interval actually simulated. Time spent `Idle` counts.
    pub seconds_used: f64,
}

#[derive(Debug)]
pub struct ExpeditionEngine {
    config: EngineConfig,
    state: CombatState,
    session: Option<Session>,
    notifier: Notifier,
    combat_log: VecDeque<String>,
}

impl Default for ExpeditionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpeditionEngine {
    pub fn new() -> Self {
        Self::build(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        Self {
            combat_log: VecDeque::with_capacity(config.log_capacity),
            config,
            state: CombatState::Idle,
            session: None,
            notifier: Notifier::new(),
        }
    }

    // ── Control surface ─────────────────────────────────────────

    /// Dispatches `adventurer` against `monsters`, replacing any running
    /// session. An empty queue completes immediately.
    ///
    /// Fails without touching the engine if the adventurer is already
    /// defeated.
    pub fn start_expedition(
        &mut self,
        adventurer: CombatEntity,
        monsters: impl IntoIterator<Item = CombatEntity>,
    ) -> Result<Vec<CombatEvent>> {
        if adventurer.is_defeated() {
            return Err(CombatError::InvalidArgument(format!(
                "adventurer '{}' cannot set out while defeated",
                adventurer.name()
            )));
        }

        let queue = ExpeditionQueue::new(monsters);
        let has_monsters = !queue.is_empty();
        let travel = has_monsters && self.config.has_travel();
        let travel_seconds = if travel {
            self.config.travel_duration_seconds
        } else {
            0.0
        };

        let line = match (queue.front(), travel) {
            (None, _) => format!(
                "{} finds no monsters; the expedition is over",
                adventurer.name()
            ),
            (Some(_), true) => format!(
                "{} sets out toward {} monster(s)",
                adventurer.name(),
                queue.len()
            ),
            (Some(first), false) => format!("{} engages {}", adventurer.name(), first.name()),
        };

        self.session = Some(Session::new(adventurer, queue, travel_seconds));

        let mut events = Vec::new();
        self.log(&mut events, line);
        self.fire(
            &mut events,
            Trigger::Dispatch {
                travel,
                has_monsters,
            },
        );
        Ok(events)
    }

    /// Advances the simulation by `delta_time` seconds. Zero, negative and
    /// non-finite deltas are ignored.
    pub fn update(&mut self, delta_time: f64) -> Vec<CombatEvent> {
        self.advance(delta_time).events
    }

    /// Like [`Self::update`], but also reports how much of the interval was
    /// simulated.
    pub fn advance(&mut self, delta_time: f64) -> TickResult {
        let mut result = TickResult::default();
        if !delta_time.is_finite() || delta_time <= 0.0 {
            return result;
        }

        result.seconds_used = match self.config.tick_policy {
            TickPolicy::Stepwise => {
                self.advance_phase(delta_time, &mut result.events);
                delta_time
            }
            TickPolicy::CatchUp => self.catch_up(delta_time, &mut result.events),
        };
        result
    }

    /// Pulls the adventurer out of an active fight regardless of health.
    /// No effect outside `Fighting`.
    pub fn force_retreat(&mut self) -> Vec<CombatEvent> {
        let mut events = Vec::new();
        if self.state != CombatState::Fighting {
            return events;
        }

        if let Some(session) = self.session.as_mut() {
            session.clear_fight_carry();
            let line = format!("{} is recalled from the fight", session.adventurer.name());
            self.log(&mut events, line);
        }
        self.fire(&mut events, Trigger::ForcedRetreat);
        events
    }

    /// Drops the session and returns to `Idle`. Never reports an expedition
    /// outcome.
    pub fn reset(&mut self) -> Vec<CombatEvent> {
        let mut events = Vec::new();
        self.session = None;
        self.combat_log.clear();
        self.fire(&mut events, Trigger::Reset);
        events
    }

    pub fn set_tick_policy(&mut self, policy: TickPolicy) {
        self.config.tick_policy = policy;
    }

    // ── Notifications ───────────────────────────────────────────

    pub fn subscribe(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&CombatEvent) + 'static,
    ) -> SubscriptionId {
        self.notifier.subscribe(kind, listener)
    }

    pub fn subscribe_all(&mut self, listener: impl FnMut(&CombatEvent) + 'static) -> SubscriptionId {
        self.notifier.subscribe_all(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    // ── Queries ─────────────────────────────────────────────────

    pub fn state(&self) -> CombatState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn adventurer(&self) -> Option<EntitySnapshot> {
        self.session.as_ref().map(|s| s.adventurer.snapshot())
    }

    /// The monster being fought. `None` outside `Fighting`.
    pub fn current_monster(&self) -> Option<EntitySnapshot> {
        if !self.state.is_in_combat() {
            return None;
        }
        self.session
            .as_ref()
            .and_then(|s| s.queue.front())
            .map(CombatEntity::snapshot)
    }

    pub fn has_monsters_remaining(&self) -> bool {
        self.remaining_monsters() > 0
    }

    pub fn remaining_monsters(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.queue.len())
    }

    pub fn monsters_defeated(&self) -> u32 {
        self.session.as_ref().map_or(0, |s| s.monsters_defeated)
    }

    pub fn is_in_combat(&self) -> bool {
        self.state.is_in_combat()
    }

    /// Most recent log lines, oldest first.
    pub fn combat_log(&self) -> impl Iterator<Item = &str> {
        self.combat_log.iter().map(String::as_str)
    }

    // ── Resolution ──────────────────────────────────────────────

    /// Returns the seconds consumed. Only falls short of `delta_time` when
    /// zero-length steps stop changing anything.
    fn catch_up(&mut self, delta_time: f64, events: &mut Vec<CombatEvent>) -> f64 {
        let mut remaining = delta_time;
        let mut stalled = 0;
        loop {
            if self.state == CombatState::Idle || self.session.is_none() {
                return delta_time;
            }
            let step = self
                .time_to_next_boundary()
                .map_or(remaining, |boundary| boundary.min(remaining));
            let before = self.progress_marker();
            self.advance_phase(step, events);
            remaining -= step;

            if step <= TIME_EPSILON && self.progress_marker() == before {
                stalled += 1;
                if stalled >= MAX_STALLED_CATCH_UP_STEPS {
                    return delta_time - remaining;
                }
            } else {
                stalled = 0;
            }
            if remaining <= TIME_EPSILON {
                return delta_time;
            }
        }
    }

    fn progress_marker(&self) -> (CombatState, u32, u32) {
        let (defeated, hp) = self
            .session
            .as_ref()
            .map_or((0, 0), |s| (s.monsters_defeated, s.adventurer.current_hp()));
        (self.state, defeated, hp)
    }

    fn advance_phase(&mut self, dt: f64, events: &mut Vec<CombatEvent>) {
        match self.state {
            CombatState::Fighting => self.resolve_fight(dt, events),
            CombatState::Retreating | CombatState::Regenerating => {
                self.resolve_recovery(dt, events)
            }
            CombatState::Traveling => self.resolve_travel(dt, events),
            CombatState::Idle => {}
        }
    }

    fn resolve_fight(&mut self, dt: f64, events: &mut Vec<CombatEvent>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let outcome = exchange_blows(session, dt);

        if let Some(monster) = outcome.defeated.clone() {
            let line = format!("{} defeated {}", outcome.adventurer, monster.name);
            self.emit(events, CombatEvent::MonsterDefeated { monster });
            self.log(events, line);
        }

        if outcome.next_monster.is_none() {
            self.log(
                events,
                format!("{} cleared the expedition", outcome.adventurer),
            );
            self.fire(events, Trigger::QueueCleared);
            return;
        }

        if outcome.withdraw {
            if let Some(session) = self.session.as_mut() {
                session.clear_fight_carry();
            }
            let line = if outcome.adventurer_down {
                format!("{} collapses and is dragged to safety", outcome.adventurer)
            } else {
                format!("{} is badly hurt and retreats", outcome.adventurer)
            };
            self.log(events, line);
            self.fire(events, Trigger::ThresholdCrossed);
            return;
        }

        if outcome.defeated.is_some() {
            if let Some(next) = outcome.next_monster {
                self.log(events, format!("{} engages {}", outcome.adventurer, next));
            }
        }
    }

    fn resolve_recovery(&mut self, dt: f64, events: &mut Vec<CombatEvent>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let regen = session.adventurer.regen_per_second() as f64;
        let points = session.regen.add(regen * dt);
        session.adventurer.heal(points);

        if session.adventurer.is_full_health() {
            session.regen.clear();
            let line = format!("{} has fully recovered", session.adventurer.name());
            self.log(events, line);
            self.fire(events, Trigger::FullyHealed);
        }
    }

    fn resolve_travel(&mut self, dt: f64, events: &mut Vec<CombatEvent>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.travel_remaining = (session.travel_remaining - dt).max(0.0);
        if session.travel_remaining > TIME_EPSILON {
            return;
        }

        session.travel_remaining = 0.0;
        let line = match session.queue.front() {
            Some(first) => format!(
                "{} reaches the dungeon and engages {}",
                session.adventurer.name(),
                first.name()
            ),
            None => format!("{} reaches the dungeon", session.adventurer.name()),
        };
        self.log(events, line);
        self.fire(events, Trigger::ArrivedAtDungeon);
    }

    /// Seconds until the current phase hits its next boundary, if it has one.
    fn time_to_next_boundary(&self) -> Option<f64> {
        let session = self.session.as_ref()?;
        match self.state {
            CombatState::Idle => None,
            CombatState::Traveling => Some(session.travel_remaining),
            CombatState::Fighting => {
                let adventurer = &session.adventurer;
                let monster = session.queue.front()?;
                let kill = time_at_rate(
                    session.monster_damage.remaining_until(monster.current_hp()),
                    adventurer.attack_power(),
                );
                let withdraw = time_at_rate(
                    session
                        .adventurer_damage
                        .remaining_until(adventurer.damage_until_withdrawal()),
                    monster.attack_power(),
                );
                match (kill, withdraw) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                }
            }
            CombatState::Retreating | CombatState::Regenerating => {
                let adventurer = &session.adventurer;
                if adventurer.is_full_health() {
                    return Some(0.0);
                }
                time_at_rate(
                    session
                        .regen
                        .remaining_until(adventurer.max_hp() - adventurer.current_hp()),
                    adventurer.regen_per_second(),
                )
            }
        }
    }

    // ── Publishing ──────────────────────────────────────────────

    fn fire(&mut self, events: &mut Vec<CombatEvent>, trigger: Trigger) {
        let Some(t) = transition(self.state, trigger) else {
            return;
        };
        let changed = t.next != self.state;
        self.state = t.next;

        if changed || matches!(trigger, Trigger::Dispatch { .. }) {
            self.emit(events, CombatEvent::StateChanged { state: t.next });
        }
        if t.completes_expedition {
            self.emit(
                events,
                CombatEvent::ExpeditionCompleted {
                    ending_state: t.next,
                },
            );
        }
    }

    fn log(&mut self, events: &mut Vec<CombatEvent>, line: String) {
        if self.config.log_capacity > 0 {
            if self.combat_log.len() >= self.config.log_capacity {
                self.combat_log.pop_front();
            }
            self.combat_log.push_back(line.clone());
        }
        self.emit(events, CombatEvent::CombatLogUpdated { line });
    }

    fn emit(&mut self, events: &mut Vec<CombatEvent>, event: CombatEvent) {
        self.notifier.publish(&event);
        events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    // =========================================================================
    // Test Helpers
    // =========================================================================

    fn hero() -> CombatEntity {
        CombatEntity::adventurer("Hero", 100, 10, 0.25, 0).unwrap()
    }

    fn goblin() -> CombatEntity {
        CombatEntity::monster("Goblin", 20, 5).unwrap()
    }

    fn dummy(name: &str, hp: u32) -> CombatEntity {
        CombatEntity::monster(name, hp, 0).unwrap()
    }

    fn catch_up_engine() -> ExpeditionEngine {
        ExpeditionEngine::with_config(EngineConfig::catch_up()).unwrap()
    }

    fn has_event(events: &[CombatEvent], pred: impl Fn(&CombatEvent) -> bool) -> bool {
        events.iter().any(pred)
    }

    fn completed_with(events: &[CombatEvent], state: CombatState) -> bool {
        has_event(events, |e| {
            *e == CombatEvent::ExpeditionCompleted {
                ending_state: state,
            }
        })
    }

    fn adventurer_hp(engine: &ExpeditionEngine) -> u32 {
        engine.adventurer().map(|a| a.current_hp).unwrap_or(0)
    }

    // =========================================================================
    // Start
    // =========================================================================

    #[test]
    fn test_new_engine_is_idle() {
        let engine = ExpeditionEngine::new();
        assert_eq!(engine.state(), CombatState::Idle);
        assert!(engine.adventurer().is_none());
        assert!(engine.current_monster().is_none());
        assert!(!engine.has_monsters_remaining());
        assert!(!engine.is_in_combat());
    }

    #[test]
    fn test_start_goes_straight_to_fighting_without_travel() {
        let mut engine = ExpeditionEngine::new();
        let events = engine.start_expedition(hero(), vec![goblin()]).unwrap();

        assert_eq!(engine.state(), CombatState::Fighting);
        assert!(engine.is_in_combat());
        assert_eq!(engine.current_monster().unwrap().name, "Goblin");
        assert!(has_event(&events, |e| *e
            == CombatEvent::StateChanged {
                state: CombatState::Fighting
            }));
        assert!(!has_event(&events, |e| e.kind() == EventKind::ExpeditionCompleted));
    }

    #[test]
    fn test_start_with_empty_queue_completes_immediately() {
        let mut engine = ExpeditionEngine::new();
        let events = engine.start_expedition(hero(), Vec::new()).unwrap();

        assert_eq!(engine.state(), CombatState::Regenerating);
        assert!(completed_with(&events, CombatState::Regenerating));
        assert!(!engine.is_in_combat());
    }

    #[test]
    fn test_start_with_defeated_adventurer_fails_and_leaves_state() {
        let mut engine = ExpeditionEngine::new();
        engine.start_expedition(hero(), vec![goblin()]).unwrap();

        let err = engine
            .start_expedition(hero().with_health(0), vec![goblin()])
            .unwrap_err();

        assert!(matches!(err, CombatError::InvalidArgument(_)));
        assert_eq!(engine.state(), CombatState::Fighting);
        assert_eq!(adventurer_hp(&engine), 100);
    }

    #[test]
    fn test_start_replaces_running_session() {
        let mut engine = ExpeditionEngine::new();
        engine
            .start_expedition(hero(), vec![dummy("Rat", 5), dummy("Bat", 5)])
            .unwrap();
        engine.update(1.0);
        assert_eq!(engine.monsters_defeated(), 1);

        let events = engine
            .start_expedition(hero().with_health(60), vec![goblin()])
            .unwrap();

        assert_eq!(engine.monsters_defeated(), 0);
        assert_eq!(engine.remaining_monsters(), 1);
        assert_eq!(adventurer_hp(&engine), 60);
        assert!(has_event(&events, |e| e.kind() == EventKind::StateChanged));
    }

    #[test]
    fn test_travel_delays_first_fight() {
        let config = EngineConfig::default().with_travel(3.0);
        let mut engine = ExpeditionEngine::with_config(config).unwrap();
        engine.start_expedition(hero(), vec![goblin()]).unwrap();
        assert_eq!(engine.state(), CombatState::Traveling);
        assert!(engine.current_monster().is_none());

        engine.update(1.0);
        assert_eq!(engine.state(), CombatState::Traveling);

        let events = engine.update(2.0);
        assert_eq!(engine.state(), CombatState::Fighting);
        assert!(has_event(&events, |e| *e
            == CombatEvent::StateChanged {
                state: CombatState::Fighting
            }));
        // Arrival tick does not also fight
        assert_eq!(engine.current_monster().unwrap().current_hp, 20);
        assert_eq!(adventurer_hp(&engine), 100);
    }

    #[test]
    fn test_travel_skipped_for_empty_queue() {
        let config = EngineConfig::default().with_travel(3.0);
        let mut engine = ExpeditionEngine::with_config(config).unwrap();
        let events = engine.start_expedition(hero(), Vec::new()).unwrap();
        assert_eq!(engine.state(), CombatState::Regenerating);
        assert!(completed_with(&events, CombatState::Regenerating));
    }

    // =========================================================================
    // Update
    // =========================================================================

    #[test]
    fn test_basic_victory() {
        let mut engine = ExpeditionEngine::new();
        engine.start_expedition(hero(), vec![goblin()]).unwrap();

        let events = engine.update(2.0);

        assert_eq!(adventurer_hp(&engine), 90);
        assert!(!engine.has_monsters_remaining());
        assert_eq!(engine.state(), CombatState::Regenerating);
        assert!(has_event(&events, |e| matches!(
            e,
            CombatEvent::MonsterDefeated { monster } if monster.name == "Goblin" && monster.current_hp == 0
        )));
        assert!(completed_with(&events, CombatState::Regenerating));
    }

    #[test]
    fn test_victory_event_order() {
        let mut engine = ExpeditionEngine::new();
        engine.start_expedition(hero(), vec![goblin()]).unwrap();

        let kinds: Vec<EventKind> = engine.update(2.0).iter().map(|e| e.kind()).collect();

        let defeated = kinds.iter().position(|k| *k == EventKind::MonsterDefeated);
        let changed = kinds.iter().position(|k| *k == EventKind::StateChanged);
        let completed = kinds
            .iter()
            .position(|k| *k == EventKind::ExpeditionCompleted);
        assert!(defeated < changed);
        assert!(changed < completed);
    }

    #[test]
    fn test_partial_damage_keeps_fighting() {
        let mut engine = ExpeditionEngine::new();
        engine.start_expedition(hero(), vec![goblin()]).unwrap();

        let events = engine.update(1.0);

        assert!(events.is_empty());
        assert_eq!(engine.current_monster().unwrap().current_hp, 10);
        assert_eq!(adventurer_hp(&engine), 95);
        assert_eq!(engine.state(), CombatState::Fighting);
    }

    #[test]
    fn test_threshold_retreat_on_tiny_tick() {
        let mut engine = ExpeditionEngine::new();
        engine
            .start_expedition(hero().with_health(20), vec![goblin()])
            .unwrap();

        let events = engine.update(0.01);

        assert_eq!(engine.state(), CombatState::Retreating);
        assert!(completed_with(&events, CombatState::Retreating));
        assert!(has_event(&events, |e| *e
            == CombatEvent::StateChanged {
                state: CombatState::Retreating
            }));
        assert!(engine.current_monster().is_none());
        assert!(engine.has_monsters_remaining());
    }

    #[test]
    fn test_retreat_happens_before_death() {
        let mut engine = ExpeditionEngine::new();
        let ogre = CombatEntity::monster("Ogre", 10_000, 7).unwrap();
        engine.start_expedition(hero(), vec![ogre]).unwrap();

        for _ in 0..1_000 {
            engine.update(0.1);
            let hp = adventurer_hp(&engine);
            if engine.state() == CombatState::Fighting {
                assert!(hp >= 25, "still fighting at {hp} HP");
            }
            assert!(hp > 0);
        }
        assert_eq!(engine.state(), CombatState::Retreating);
        assert_eq!(adventurer_hp(&engine), 24);
    }

    #[test]
    fn test_regeneration_to_full() {
        let mut engine = ExpeditionEngine::new();
        let adventurer = CombatEntity::adventurer("Hero", 100, 10, 0.25, 1)
            .unwrap()
            .with_health(50);
        engine.start_expedition(adventurer, Vec::new()).unwrap();
        assert_eq!(engine.state(), CombatState::Regenerating);

        let events = engine.update(50.0);

        assert_eq!(adventurer_hp(&engine), 100);
        assert_eq!(engine.state(), CombatState::Idle);
        assert!(has_event(&events, |e| *e
            == CombatEvent::StateChanged {
                state: CombatState::Idle
            }));
        assert!(!has_event(&events, |e| e.kind() == EventKind::ExpeditionCompleted));
    }

    #[test]
    fn test_retreating_heals_back_to_idle() {
        let mut engine = ExpeditionEngine::new();
        let adventurer = CombatEntity::adventurer("Hero", 100, 10, 0.25, 4)
            .unwrap()
            .with_health(20);
        engine.start_expedition(adventurer, vec![goblin()]).unwrap();
        engine.update(0.01);
        assert_eq!(engine.state(), CombatState::Retreating);

        engine.update(10.0);
        assert_eq!(adventurer_hp(&engine), 60);
        assert_eq!(engine.state(), CombatState::Retreating);

        engine.update(10.0);
        assert_eq!(engine.state(), CombatState::Idle);
        assert_eq!(adventurer_hp(&engine), 100);
    }

    #[test]
    fn test_no_regen_stays_recovering() {
        let mut engine = ExpeditionEngine::new();
        engine
            .start_expedition(hero().with_health(50), Vec::new())
            .unwrap();
        engine.update(1_000.0);
        assert_eq!(engine.state(), CombatState::Regenerating);
        assert_eq!(adventurer_hp(&engine), 50);
    }

    #[test]
    fn test_transition_tick_does_not_also_regenerate() {
        let mut engine = ExpeditionEngine::new();
        let adventurer = CombatEntity::adventurer("Hero", 100, 10, 0.25, 5).unwrap();
        engine.start_expedition(adventurer, vec![goblin()]).unwrap();

        engine.update(2.0);
        assert_eq!(adventurer_hp(&engine), 90);

        engine.update(1.0);
        assert_eq!(adventurer_hp(&engine), 95);
    }

    #[test]
    fn test_full_health_victory_goes_idle_next_tick() {
        let mut engine = ExpeditionEngine::new();
        engine.start_expedition(hero(), vec![dummy("Rat", 5)]).unwrap();
        engine.update(1.0);
        assert_eq!(engine.state(), CombatState::Regenerating);

        engine.update(0.1);
        assert_eq!(engine.state(), CombatState::Idle);
    }

    #[test]
    fn test_mutual_knockout_with_last_monster_is_victory() {
        let mut engine = ExpeditionEngine::new();
        let adventurer = CombatEntity::adventurer("Hero", 10, 10, 0.0, 0).unwrap();
        let brute = CombatEntity::monster("Brute", 10, 10).unwrap();
        engine.start_expedition(adventurer, vec![brute]).unwrap();

        let events = engine.update(1.0);

        assert_eq!(adventurer_hp(&engine), 0);
        assert_eq!(engine.state(), CombatState::Regenerating);
        assert!(completed_with(&events, CombatState::Regenerating));
    }

    #[test]
    fn test_mutual_knockout_with_monsters_left_reports_defeat_then_retreats() {
        let mut engine = ExpeditionEngine::new();
        let adventurer = CombatEntity::adventurer("Hero", 10, 10, 0.0, 0).unwrap();
        let brute = CombatEntity::monster("Brute", 10, 10).unwrap();
        engine
            .start_expedition(adventurer, vec![brute, goblin()])
            .unwrap();

        let events = engine.update(1.0);
        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind()).collect();

        let defeated = kinds.iter().position(|k| *k == EventKind::MonsterDefeated);
        let completed = kinds
            .iter()
            .position(|k| *k == EventKind::ExpeditionCompleted);
        assert!(defeated.is_some());
        assert!(defeated < completed);
        assert_eq!(engine.state(), CombatState::Retreating);
        assert_eq!(engine.remaining_monsters(), 1);
    }

    #[test]
    fn test_zero_threshold_adventurer_withdraws_when_defeated() {
        let mut engine = ExpeditionEngine::new();
        let berserker = CombatEntity::adventurer("Berserker", 30, 1, 0.0, 0).unwrap();
        let troll = CombatEntity::monster("Troll", 500, 10).unwrap();
        engine.start_expedition(berserker, vec![troll]).unwrap();

        engine.update(2.0);
        assert_eq!(engine.state(), CombatState::Fighting);
        assert_eq!(adventurer_hp(&engine), 10);

        let events = engine.update(2.0);
        assert_eq!(adventurer_hp(&engine), 0);
        assert_eq!(engine.state(), CombatState::Retreating);
        assert!(completed_with(&events, CombatState::Retreating));
    }

    #[test]
    fn test_non_positive_delta_is_noop() {
        let mut engine = ExpeditionEngine::new();
        engine.start_expedition(hero(), vec![goblin()]).unwrap();
        for dt in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(engine.update(dt).is_empty());
        }
        assert_eq!(engine.current_monster().unwrap().current_hp, 20);
        assert_eq!(adventurer_hp(&engine), 100);
    }

    #[test]
    fn test_update_while_idle_is_noop() {
        let mut engine = ExpeditionEngine::new();
        assert!(engine.update(10.0).is_empty());
        assert_eq!(engine.state(), CombatState::Idle);
    }

    #[test]
    fn test_time_step_invariance_single_fight() {
        let ogre = || CombatEntity::monster("Ogre", 1_000, 5).unwrap();

        let mut once = ExpeditionEngine::new();
        once.start_expedition(hero(), vec![ogre()]).unwrap();
        once.update(10.0);

        let mut many = ExpeditionEngine::new();
        many.start_expedition(hero(), vec![ogre()]).unwrap();
        for _ in 0..10 {
            many.update(1.0);
        }

        assert_eq!(adventurer_hp(&once), 50);
        assert_eq!(adventurer_hp(&once), adventurer_hp(&many));
        assert_eq!(
            once.current_monster().unwrap().current_hp,
            many.current_monster().unwrap().current_hp
        );
        assert_eq!(once.current_monster().unwrap().current_hp, 900);
    }

    #[test]
    fn test_fractional_damage_carries_between_ticks() {
        let mut engine = ExpeditionEngine::new();
        let slow = CombatEntity::monster("Snail", 1_000, 3).unwrap();
        engine.start_expedition(hero(), vec![slow]).unwrap();

        for _ in 0..10 {
            engine.update(0.1);
        }

        assert_eq!(adventurer_hp(&engine), 97);
        assert_eq!(engine.current_monster().unwrap().current_hp, 990);
    }

    // =========================================================================
    // Tick policy
    // =========================================================================

    #[test]
    fn test_stepwise_defeats_one_monster_per_update() {
        let mut engine = ExpeditionEngine::new();
        engine
            .start_expedition(hero(), vec![dummy("A", 5), dummy("B", 5), dummy("C", 5)])
            .unwrap();

        let events = engine.update(100.0);
        let kills = events
            .iter()
            .filter(|e| e.kind() == EventKind::MonsterDefeated)
            .count();

        assert_eq!(kills, 1);
        assert_eq!(engine.state(), CombatState::Fighting);
        assert_eq!(engine.current_monster().unwrap().name, "B");
        // Next monster is untouched until the following update
        assert_eq!(engine.current_monster().unwrap().current_hp, 5);
    }

    #[test]
    fn test_catch_up_clears_whole_queue_in_one_update() {
        let mut engine = catch_up_engine();
        engine
            .start_expedition(hero(), vec![dummy("A", 5), dummy("B", 5), dummy("C", 5)])
            .unwrap();

        let events = engine.update(100.0);
        let kills = events
            .iter()
            .filter(|e| e.kind() == EventKind::MonsterDefeated)
            .count();

        assert_eq!(kills, 3);
        assert_eq!(engine.monsters_defeated(), 3);
        assert!(completed_with(&events, CombatState::Regenerating));
        // Full health with no regen needed: recovery finishes in the same call
        assert_eq!(engine.state(), CombatState::Idle);
    }

    #[test]
    fn test_catch_up_splits_damage_at_defeat_boundary() {
        let mut engine = catch_up_engine();
        let rats = vec![
            CombatEntity::monster("Rat", 10, 2).unwrap(),
            CombatEntity::monster("Rat", 10, 2).unwrap(),
        ];
        engine.start_expedition(hero(), rats).unwrap();

        engine.update(1.5);

        // One second per rat: 2 damage from the first, 1 from half the second
        assert_eq!(engine.monsters_defeated(), 1);
        assert_eq!(adventurer_hp(&engine), 97);
        assert_eq!(engine.current_monster().unwrap().current_hp, 5);
    }

    #[test]
    fn test_catch_up_retreats_exactly_at_threshold() {
        let mut engine = catch_up_engine();
        let ogre = CombatEntity::monster("Ogre", 10_000, 4).unwrap();
        engine.start_expedition(hero(), vec![ogre]).unwrap();

        let events = engine.update(3_600.0);

        assert!(completed_with(&events, CombatState::Retreating));
        // Withdrawal at 24 HP (76 damage = 19 s), then no regen
        assert_eq!(adventurer_hp(&engine), 24);
        assert_eq!(engine.state(), CombatState::Retreating);
        assert_eq!(engine.session().unwrap().queue().front().unwrap().current_hp(), 10_000 - 190);
    }

    #[test]
    fn test_catch_up_matches_stepwise_within_one_fight() {
        let ogre = || CombatEntity::monster("Ogre", 1_000, 3).unwrap();

        let mut stepwise = ExpeditionEngine::new();
        stepwise.start_expedition(hero(), vec![ogre()]).unwrap();
        for _ in 0..20 {
            stepwise.update(0.5);
        }

        let mut catch_up = catch_up_engine();
        catch_up.start_expedition(hero(), vec![ogre()]).unwrap();
        catch_up.update(10.0);

        assert_eq!(adventurer_hp(&stepwise), adventurer_hp(&catch_up));
        assert_eq!(
            stepwise.current_monster().unwrap().current_hp,
            catch_up.current_monster().unwrap().current_hp
        );
    }

    #[test]
    fn test_catch_up_travel_then_fight() {
        let config = EngineConfig::catch_up().with_travel(5.0);
        let mut engine = ExpeditionEngine::with_config(config).unwrap();
        engine.start_expedition(hero(), vec![goblin()]).unwrap();

        engine.update(6.0);

        assert_eq!(engine.state(), CombatState::Fighting);
        assert_eq!(engine.current_monster().unwrap().current_hp, 10);
        assert_eq!(adventurer_hp(&engine), 95);
    }

    #[test]
    fn test_catch_up_stalemate_consumes_interval() {
        let mut engine = catch_up_engine();
        let pacifist = CombatEntity::adventurer("Pacifist", 100, 0, 0.25, 0).unwrap();
        engine
            .start_expedition(pacifist, vec![dummy("Statue", 10)])
            .unwrap();
        assert!(engine.update(1_000_000.0).is_empty());
        assert_eq!(engine.state(), CombatState::Fighting);
    }

    #[test]
    fn test_catch_up_has_no_boundary_budget() {
        let mut engine = catch_up_engine();
        let slayer = CombatEntity::adventurer("Slayer", 100, 100, 0.25, 0).unwrap();
        let rats = (0..15_000).map(|_| dummy("Rat", 1));
        engine.start_expedition(slayer, rats).unwrap();

        // 0.01 s per rat: the whole queue falls well inside the hour
        let result = engine.advance(3_600.0);

        assert_eq!(engine.monsters_defeated(), 15_000);
        assert!(!engine.has_monsters_remaining());
        assert_eq!(engine.state(), CombatState::Idle);
        assert_eq!(result.seconds_used, 3_600.0);
    }

    #[test]
    fn test_advance_reports_seconds_used() {
        let mut engine = ExpeditionEngine::new();
        assert_eq!(engine.advance(-1.0), TickResult::default());

        engine.start_expedition(hero(), vec![goblin()]).unwrap();
        let result = engine.advance(0.5);
        assert_eq!(result.seconds_used, 0.5);
        assert!(result.events.is_empty());
    }

    // =========================================================================
    // Force retreat & reset
    // =========================================================================

    #[test]
    fn test_force_retreat_while_fighting() {
        let mut engine = ExpeditionEngine::new();
        engine.start_expedition(hero(), vec![goblin()]).unwrap();

        let events = engine.force_retreat();

        assert_eq!(engine.state(), CombatState::Retreating);
        assert!(completed_with(&events, CombatState::Retreating));
        assert_eq!(adventurer_hp(&engine), 100);
    }

    #[test]
    fn test_force_retreat_outside_fight_is_noop() {
        let mut engine = ExpeditionEngine::new();
        assert!(engine.force_retreat().is_empty());

        let config = EngineConfig::default().with_travel(5.0);
        let mut traveling = ExpeditionEngine::with_config(config).unwrap();
        traveling.start_expedition(hero(), vec![goblin()]).unwrap();
        assert!(traveling.force_retreat().is_empty());
        assert_eq!(traveling.state(), CombatState::Traveling);

        let mut engine = ExpeditionEngine::new();
        engine.start_expedition(hero(), vec![goblin()]).unwrap();
        engine.force_retreat();
        assert!(engine.force_retreat().is_empty());
    }

    #[test]
    fn test_reset_clears_session_without_completion() {
        let mut engine = ExpeditionEngine::new();
        engine.start_expedition(hero(), vec![goblin()]).unwrap();

        let events = engine.reset();

        assert_eq!(engine.state(), CombatState::Idle);
        assert!(engine.adventurer().is_none());
        assert!(!engine.has_monsters_remaining());
        assert_eq!(engine.combat_log().count(), 0);
        assert!(!has_event(&events, |e| e.kind() == EventKind::ExpeditionCompleted));
        assert_eq!(
            events,
            vec![CombatEvent::StateChanged {
                state: CombatState::Idle
            }]
        );
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut engine = ExpeditionEngine::new();
        engine.start_expedition(hero(), vec![goblin()]).unwrap();
        engine.reset();

        let events = engine.reset();

        assert!(events.is_empty());
        assert_eq!(engine.state(), CombatState::Idle);
        assert!(engine.adventurer().is_none());
        assert_eq!(engine.remaining_monsters(), 0);
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    #[test]
    fn test_listeners_receive_published_events() {
        let mut engine = ExpeditionEngine::new();
        let loot_rolls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&loot_rolls);
        engine.subscribe(EventKind::MonsterDefeated, move |e| {
            if let CombatEvent::MonsterDefeated { monster } = e {
                sink.borrow_mut().push(monster.name.clone());
            }
        });

        engine
            .start_expedition(hero(), vec![dummy("Rat", 5), dummy("Bat", 5)])
            .unwrap();
        engine.update(1.0);
        engine.update(1.0);

        assert_eq!(*loot_rolls.borrow(), vec!["Rat", "Bat"]);
    }

    #[test]
    fn test_listener_sees_same_stream_as_return_values() {
        let mut engine = ExpeditionEngine::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = engine.subscribe_all(move |e| sink.borrow_mut().push(e.clone()));

        let mut returned = engine.start_expedition(hero(), vec![goblin()]).unwrap();
        returned.extend(engine.update(2.0));

        assert_eq!(*seen.borrow(), returned);
        assert!(engine.unsubscribe(id));
    }

    #[test]
    fn test_combat_log_is_bounded() {
        let config = EngineConfig {
            log_capacity: 2,
            ..EngineConfig::default()
        };
        let mut engine = ExpeditionEngine::with_config(config).unwrap();
        let monsters: Vec<_> = (0..5).map(|i| dummy(&format!("Rat {i}"), 5)).collect();
        engine.start_expedition(hero(), monsters).unwrap();
        for _ in 0..5 {
            engine.update(1.0);
        }

        let lines: Vec<&str> = engine.combat_log().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.last().copied(), Some("Hero cleared the expedition"));
    }
}
