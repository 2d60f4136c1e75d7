//! Error types for the digitization boundary layer.

use thiserror::Error;

/// Errors raised by the collaborators of the digitization stage.
#[derive(Debug, Error)]
pub enum EnvError {
    /// No hit source is configured under this identifier
    #[error("No hit source configured for source id {0}")]
    SourceMissing(u32),

    /// The hit source carries no collection of the requested kind
    #[error("No branch '{kind}' found in {location}")]
    BranchMissing { kind: String, location: String },

    /// The hit source has no such entry
    #[error("Entry {entry} not found in {location}")]
    EntryMissing { entry: u32, location: String },

    /// Labels must be added in non-decreasing digit order
    #[error("Label for digit {index} added after digit {last}")]
    LabelOrder { index: usize, last: usize },

    /// Run context is inconsistent (records and parts disagree)
    #[error("Malformed run context: {0}")]
    MalformedContext(String),

    /// Backing store failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Payload serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Digitization engine failed
    #[error("Digitizer error: {0}")]
    Engine(String),

    /// Output boundary rejected a data product
    #[error("Output error: {0}")]
    Output(String),
}

impl EnvError {
    /// Creates a missing-branch error.
    pub fn branch_missing(kind: impl std::fmt::Display, location: impl Into<String>) -> Self {
        Self::BranchMissing {
            kind: kind.to_string(),
            location: location.into(),
        }
    }

    /// Creates a missing-entry error.
    pub fn entry_missing(entry: u32, location: impl Into<String>) -> Self {
        Self::EntryMissing {
            entry,
            location: location.into(),
        }
    }

    /// Creates an output error.
    pub fn output(msg: impl Into<String>) -> Self {
        Self::Output(msg.into())
    }

    /// Returns true when the requested hit set simply does not exist.
    ///
    /// Misses are non-fatal for a merge pass; everything else is a real failure
    /// of the backing store.
    pub fn is_miss(&self) -> bool {
        matches!(
            self,
            Self::SourceMissing(_) | Self::BranchMissing { .. } | Self::EntryMissing { .. }
        )
    }
}

impl From<sled::Error> for EnvError {
    fn from(err: sled::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for EnvError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
