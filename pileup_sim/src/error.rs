//! Error types for the simulation harness.

use pileup_core::CoreError;
use pileup_env::EnvError;
use thiserror::Error;

/// Errors raised while setting up or running a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// A random distribution was given unusable parameters
    #[error("Invalid distribution parameter: {0}")]
    Distribution(String),

    /// Boundary-layer failure (stores, labels, outputs)
    #[error(transparent)]
    Env(#[from] EnvError),

    /// Stage failure
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    pub fn distribution(err: impl std::fmt::Display) -> Self {
        Self::Distribution(err.to_string())
    }
}
