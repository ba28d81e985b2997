//! Shared constants and offline progression.

pub mod constants;
pub mod offline;

pub use constants::*;
pub use offline::{process_offline_progress, OfflineReport};
