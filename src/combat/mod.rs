//! Combat entities, the expedition state machine and its notifications.

pub mod config;
pub mod events;
pub mod logic;
pub mod session;
pub mod state;
pub mod types;

pub use config::{EngineConfig, TickPolicy};
pub use events::{CombatEvent, EventKind, Notifier, SubscriptionId};
pub use logic::{ExpeditionEngine, TickResult};
pub use session::Session;
pub use state::{transition, CombatState, Transition, Trigger};
pub use types::{CombatEntity, CombatStats, EntitySnapshot, ExpeditionQueue, PointAccumulator};
