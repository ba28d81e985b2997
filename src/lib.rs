//! Delve - Idle Dungeon Expedition Combat Library
//!
//! Time-driven expedition engine: an adventurer works through a queue of
//! monsters, retreats when hurt, regenerates, and reports every change
//! through events.

pub mod combat;
pub mod commands;
pub mod core;
pub mod error;
pub mod simulator;

pub use combat::{
    CombatEntity, CombatEvent, CombatState, CombatStats, EngineConfig, EventKind,
    ExpeditionEngine, TickPolicy,
};
pub use error::{CombatError, Result};
