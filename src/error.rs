//! Error types for kvbucket
//!
//! Provides a unified error type for all store operations.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for kvbucket operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Engine Errors
    // -------------------------------------------------------------------------
    #[error("{op} failed on table '{table}': {source}")]
    Storage {
        op: &'static str,
        table: String,
        #[source]
        source: redb::Error,
    },

    #[error("Backup at {path:?} failed verification: expected crc {expected:#010x}, got {actual:#010x}")]
    BackupVerification {
        path: PathBuf,
        expected: u32,
        actual: u32,
    },

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Timed out after {waited:?} waiting for the lock on {path:?}")]
    LockTimeout { path: PathBuf, waited: Duration },
}

/// Coarse classification of a [`StoreError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid construction arguments; fix the configuration
    Config,
    /// Filesystem or storage engine failure
    Io,
    /// Exclusive access not obtained within the bounded wait
    LockTimeout,
}

impl StoreError {
    /// Wrap an engine error with the operation and table it came from
    pub(crate) fn storage(op: &'static str, table: &str, source: impl Into<redb::Error>) -> Self {
        StoreError::Storage {
            op,
            table: table.to_string(),
            source: source.into(),
        }
    }

    /// Which of the three failure classes this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Config(_) => ErrorKind::Config,
            StoreError::LockTimeout { .. } => ErrorKind::LockTimeout,
            StoreError::Io(_)
            | StoreError::Storage { .. }
            | StoreError::BackupVerification { .. } => ErrorKind::Io,
        }
    }

    /// Only a lock timeout is worth retrying unchanged
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::LockTimeout
    }
}
