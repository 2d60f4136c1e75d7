//! Error types for the merge engine.

use pileup_env::EnvError;
use thiserror::Error;

/// Errors surfaced by the digitization stage.
///
/// Missing hit data never shows up here: retrieval misses are absorbed by the
/// merge loop and only counted.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Stage configuration is unusable
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A configured hit source could not be opened
    #[error("Cannot open hit source '{location}': {source}")]
    SourceOpen {
        location: String,
        #[source]
        source: EnvError,
    },

    /// The digitizer refused to initialize
    #[error("Digitizer initialization failed: {0}")]
    DigitizerInit(#[source] EnvError),

    /// A data product could not be handed to the output boundary
    #[error("Emission of {output} failed: {source}")]
    Emit {
        output: String,
        #[source]
        source: EnvError,
    },
}

impl CoreError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result alias for the merge engine.
pub type Result<T> = std::result::Result<T, CoreError>;
