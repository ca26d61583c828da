//! Error types for the simulation core.

use thiserror::Error;

/// Errors raised by the simulation core and its file helpers
#[derive(Debug, Error)]
pub enum SimError {
    /// Rejected at creation time, never mid-run
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An internal invariant was broken. The simulation must be discarded.
    #[error("agent consistency violation: {0}")]
    AgentConsistencyViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    /// True for errors that indicate a bug in the core rather than bad input
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AgentConsistencyViolation(_))
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
