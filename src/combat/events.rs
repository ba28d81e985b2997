//! Outbound notifications and the observer list that fans them out.
//!
//! The engine only publishes. Loot generation, UI and progression tracking
//! subscribe here (or drain the event lists returned by engine operations)
//! without the engine knowing about them.

use super::state::CombatState;
use super::types::EntitySnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    StateChanged {
        state: CombatState,
    },
    /// Free text for display. Not a parseable contract.
    CombatLogUpdated {
        line: String,
    },
    /// Final stats of the monster that just fell. Loot tables listen for this.
    MonsterDefeated {
        monster: EntitySnapshot,
    },
    /// `Retreating` means the adventurer withdrew, `Regenerating` means the
    /// queue was cleared.
    ExpeditionCompleted {
        ending_state: CombatState,
    },
}

impl CombatEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            CombatEvent::StateChanged { .. } => EventKind::StateChanged,
            CombatEvent::CombatLogUpdated { .. } => EventKind::CombatLogUpdated,
            CombatEvent::MonsterDefeated { .. } => EventKind::MonsterDefeated,
            CombatEvent::ExpeditionCompleted { .. } => EventKind::ExpeditionCompleted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    StateChanged,
    CombatLogUpdated,
    MonsterDefeated,
    ExpeditionCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&CombatEvent)>;

struct Subscription {
    id: SubscriptionId,
    kind: Option<EventKind>,
    listener: Listener,
}

/// Registered callbacks, optionally filtered to one [`EventKind`].
#[derive(Default)]
pub struct Notifier {
    next_id: u64,
    subscriptions: Vec<Subscription>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for one kind of event.
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&CombatEvent) + 'static,
    ) -> SubscriptionId {
        self.register(Some(kind), Box::new(listener))
    }

    /// Registers a listener for every event.
    pub fn subscribe_all(&mut self, listener: impl FnMut(&CombatEvent) + 'static) -> SubscriptionId {
        self.register(None, Box::new(listener))
    }

    /// Returns false if the id was unknown (already removed).
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Delivers `event` to matching listeners in registration order.
    pub fn publish(&mut self, event: &CombatEvent) {
        let kind = event.kind();
        for sub in &mut self.subscriptions {
            if sub.kind.map_or(true, |k| k == kind) {
                (sub.listener)(event);
            }
        }
    }

    fn register(&mut self, kind: Option<EventKind>, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription { id, kind, listener });
        id
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.subscriptions.len())
            .finish()
    }
}
