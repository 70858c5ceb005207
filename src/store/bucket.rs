//! Store
//!
//! Open-per-call façade over one table. Nothing is held between calls: each
//! operation obtains a [`Session`], runs one transaction and drops it before
//! returning. Calls from this process on the same file share one handle, so
//! the file stays open only while some call is in flight.
//!
//! Only [`Store::ensure_table`] and the writes create the table; reads and
//! backups never change which tables exist.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};

use super::backup::BackupReport;
use super::{Entries, Session};

/// Handle on one table of a database file
///
/// Cheap to construct and to clone; it carries configuration only. `Store`
/// values on the same path in one process share the open file: readers run
/// on concurrent snapshots and writers take turns. Another process waits up
/// to `lock_timeout` for the file to be closed.
#[derive(Debug, Clone)]
pub struct Store {
    config: StoreConfig,
}

impl Store {
    /// Bind a store to `table` in the file at `path`, with default timeouts
    pub fn new(path: impl Into<PathBuf>, table: impl Into<String>) -> Result<Self> {
        Self::open(StoreConfig::builder().path(path).table(table).build())
    }

    /// Validate the config and create the file's parent directory
    ///
    /// The database file itself is not touched until the first operation.
    pub fn open(config: StoreConfig) -> Result<Self> {
        if config.path.as_os_str().is_empty() {
            return Err(StoreError::Config("database path required".to_string()));
        }
        if config.table.is_empty() {
            return Err(StoreError::Config("table name required".to_string()));
        }

        // A bare file name has an empty parent: nothing to create
        if let Some(dir) = config.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        Ok(Self { config })
    }

    /// A store on another table of the same file, with the same timeouts
    pub fn with_table(&self, table: impl Into<String>) -> Result<Self> {
        let mut config = self.config.clone();
        config.table = table.into();
        Self::open(config)
    }

    /// Open the file and keep it open until the returned session is dropped
    pub fn session(&self) -> Result<Session> {
        Session::open(&self.config)
    }

    /// Create the table if it does not exist yet
    pub fn ensure_table(&self) -> Result<()> {
        self.session()?.ensure_table()
    }

    // =========================================================================
    // Operations (one open, one transaction, one close each)
    // =========================================================================

    /// Write all pairs atomically; see [`Session::set`]
    pub fn set<I, K, V>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.session()?.set(entries)
    }

    /// Remove the listed keys atomically; absent keys are ignored
    pub fn delete<I, K>(&self, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.session()?.delete(keys)
    }

    /// Values of the listed keys that exist
    pub fn get<I, K>(&self, keys: I) -> Result<Entries>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.session()?.get(keys)
    }

    /// Every entry of the table
    pub fn get_all(&self) -> Result<Entries> {
        self.session()?.get_all()
    }

    /// Number of entries in the table; a missing table counts as empty
    pub fn len(&self) -> Result<u64> {
        self.session()?.len()
    }

    /// Whether the table holds no entries
    pub fn is_empty(&self) -> Result<bool> {
        self.session()?.is_empty()
    }

    /// Write a copy of the whole file to `dest`; see [`Session::backup`]
    ///
    /// The source file must already exist. It is opened without creating
    /// anything and only read.
    pub fn backup(&self, dest: impl AsRef<Path>) -> Result<BackupReport> {
        Session::open_existing(&self.config)?.backup(dest)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn table(&self) -> &str {
        &self.config.table
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}
