use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the maintenance dashboard crates.
///
/// Only structural defects end up here. Field-level problems (a bad
/// timestamp, a blank failure, a non-numeric meter reading) are resolved to
/// defaults by the reconciler and never surface as errors.
#[derive(Error, Debug)]
pub enum MaintenanceError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The input document is not a sequence of records.
    #[error("Expected a sequence of maintenance records, found {0}")]
    NotASequence(String),

    /// A record in the sequence is not an object or lacks its tag.
    #[error("Invalid record at position {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    /// The expected data path does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// No JSON or JSONL record files were found under the given directory.
    #[error("No record files found in {0}")]
    NoDataFiles(PathBuf),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MaintenanceError {
    /// `true` for failures that may clear up on a later attempt, such as a
    /// file being rewritten while it is read. Malformed documents and
    /// missing paths fail the same way every time.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MaintenanceError::FileRead { .. } | MaintenanceError::Io(_) | MaintenanceError::Other(_)
        )
    }
}

/// Convenience alias used throughout the maintenance crates.
pub type Result<T> = std::result::Result<T, MaintenanceError>;
