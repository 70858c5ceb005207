//! Configuration for kvbucket
//!
//! Centralized store configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a [`Store`](crate::Store)
#[derive(Debug, Clone)]
pub struct StoreConfig {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Location of the single database file. Every table lives in this file;
    /// its parent directory is created when the store is opened.
    pub path: PathBuf,

    /// Table (bucket) the store reads and writes
    pub table: String,

    // -------------------------------------------------------------------------
    // Locking Configuration
    // -------------------------------------------------------------------------
    /// How long an open waits for another holder of the file lock
    pub lock_timeout: Duration,

    /// Average pause between two attempts to take the file lock
    /// (each pause is jittered by ±50%)
    pub retry_interval: Duration,

    // -------------------------------------------------------------------------
    // Backup Configuration
    // -------------------------------------------------------------------------
    /// Reopen each backup and compare its digest before publishing it.
    /// Costs a second full read of the copy.
    pub verify_backups: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./kvbucket.redb"),
            table: "default".to_string(),
            lock_timeout: Duration::from_secs(1),
            retry_interval: Duration::from_millis(5),
            verify_backups: true,
        }
    }
}

impl StoreConfig {
    /// Create a new config builder
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }
}

/// Builder for StoreConfig
#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set the database file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the table name
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.config.table = table.into();
        self
    }

    /// Set the lock wait bound (zero means a single attempt)
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.config.lock_timeout = timeout;
        self
    }

    /// Set the lock wait bound in milliseconds
    pub fn lock_timeout_ms(mut self, ms: u64) -> Self {
        self.config.lock_timeout = Duration::from_millis(ms);
        self
    }

    /// Set the pause between lock attempts
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.config.retry_interval = interval;
        self
    }

    /// Enable or disable backup verification
    pub fn verify_backups(mut self, verify: bool) -> Self {
        self.config.verify_backups = verify;
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}
