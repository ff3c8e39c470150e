//! Error types for the swimedit_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for swimedit_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Fewer segments selected than the operation needs
    #[error("Select at least {required} lengths (got {given})")]
    InsufficientSelection { required: usize, given: usize },

    /// No segments selected at all
    #[error("Select at least one length")]
    EmptySelection,

    /// Selection has the wrong shape for the operation
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// Split part count outside the supported range
    #[error("Part count {0} is outside the range 2..=10")]
    InvalidPartCount(u32),

    /// Operation parameter rejected (e.g. non-positive pool length)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Selected ordinal does not exist in the current segment store
    #[error("Length {0} does not exist in the current workout")]
    ReferenceNotFound(u32),

    /// Snapshot could not be persisted
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Decoded workout does not have the shape this engine needs
    #[error("Codec error: {0}")]
    Codec(String),

    /// Editing state missing or inconsistent
    #[error("State error: {0}")]
    State(String),
}

/// Coarse classification used for user-facing messaging
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidSelection,
    InvalidParameter,
    ReferenceNotFound,
    StorageUnavailable,
    Internal,
}

impl Error {
    /// Map this error onto the editing error taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InsufficientSelection { .. }
            | Error::EmptySelection
            | Error::InvalidSelection(_) => ErrorKind::InvalidSelection,
            Error::InvalidPartCount(_) | Error::InvalidParameter(_) => ErrorKind::InvalidParameter,
            Error::ReferenceNotFound(_) => ErrorKind::ReferenceNotFound,
            Error::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            _ => ErrorKind::Internal,
        }
    }

    /// True for conditions the caller can recover from by changing its input
    /// or by carrying on without persistence.
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::Internal
    }
}
