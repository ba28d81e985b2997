//! Error types surfaced by the expedition core and its driver layer.
//!
//! The core only ever fails for invalid configuration or invalid caller
//! usage. Benign conditions (empty queue, zero delta, redundant reset) are
//! normal control flow and never produce an error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CombatError {
    #[error("Invalid configuration for '{name}': {reason}")]
    InvalidConfiguration { name: String, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Missing required stat block: {0}")]
    MissingStatBlock(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scenario error: {0}")]
    Scenario(#[from] serde_json::Error),
}

impl CombatError {
    pub(crate) fn invalid_config(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors that indicate a programming mistake by the caller
    /// rather than an environmental failure.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration { .. } | Self::InvalidArgument(_) | Self::MissingStatBlock(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CombatError>;
