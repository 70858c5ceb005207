//! Session
//!
//! An explicitly held database handle. Each call still runs exactly one
//! transaction; the file is closed once the session and every in-flight
//! call sharing its handle are gone.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::{Database, ReadableTable, ReadableTableMetadata, TableError};
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};

use super::handle::{acquire, bucket, ensure_bucket, OpenMode};
use super::Entries;

/// Open handle on one table of the database file
///
/// Calls from this process on the same file share the session's handle, so
/// they proceed alongside it. Other processes cannot open the file while the
/// session lives and eventually fail with [`StoreError::LockTimeout`]. Drop
/// it as soon as the batch of work is done.
pub struct Session {
    /// Shared database handle; the file closes when the last clone drops
    pub(super) db: Arc<Database>,

    /// Table every call operates on
    pub(super) table: String,

    /// File the handle was opened on
    pub(super) path: PathBuf,

    /// Re-read backups before publishing them
    pub(super) verify_backups: bool,
}

impl Session {
    /// Open (creating if absent) the file under the configured lock wait
    ///
    /// The table itself is not created here: writes create it inside their
    /// own transaction and reads treat a missing table as empty.
    pub(crate) fn open(config: &StoreConfig) -> Result<Self> {
        Self::with_mode(config, OpenMode::Create)
    }

    /// Open an existing file only; a missing file is an error
    pub(crate) fn open_existing(config: &StoreConfig) -> Result<Self> {
        Self::with_mode(config, OpenMode::Existing)
    }

    fn with_mode(config: &StoreConfig, mode: OpenMode) -> Result<Self> {
        let db = acquire(
            &config.path,
            &config.table,
            mode,
            config.lock_timeout,
            config.retry_interval,
        )?;

        Ok(Self {
            db,
            table: config.table.clone(),
            path: config.path.clone(),
            verify_backups: config.verify_backups,
        })
    }

    /// Create the table if it does not exist yet
    pub fn ensure_table(&self) -> Result<()> {
        ensure_bucket(&self.db, &self.table)
    }

    /// Table this session reads and writes
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Database file this session holds open
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Mutation Path
    // =========================================================================

    /// Write every pair in one transaction
    ///
    /// Either all pairs are committed or none are. When the same key appears
    /// more than once, the last occurrence wins.
    pub fn set<I, K, V>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let txn = self.db.begin_write().map_err(|e| self.fail("set", e))?;

        let mut written = 0usize;
        {
            let mut table = txn
                .open_table(bucket(&self.table))
                .map_err(|e| self.fail("set", e))?;

            for (key, value) in entries {
                table
                    .insert(key.as_ref(), value.as_ref())
                    .map_err(|e| self.fail("set", e))?;
                written += 1;
            }
        }

        // An early return above drops `txn` uncommitted, which aborts it
        txn.commit().map_err(|e| self.fail("set", e))?;

        debug!(table = %self.table, written, "set entries");
        Ok(())
    }

    /// Remove every listed key in one transaction; absent keys are ignored
    pub fn delete<I, K>(&self, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let txn = self.db.begin_write().map_err(|e| self.fail("delete", e))?;

        let mut removed = 0usize;
        {
            let mut table = txn
                .open_table(bucket(&self.table))
                .map_err(|e| self.fail("delete", e))?;

            for key in keys {
                if table
                    .remove(key.as_ref())
                    .map_err(|e| self.fail("delete", e))?
                    .is_some()
                {
                    removed += 1;
                }
            }
        }

        txn.commit().map_err(|e| self.fail("delete", e))?;

        debug!(table = %self.table, removed, "deleted keys");
        Ok(())
    }

    // =========================================================================
    // Read Path
    // =========================================================================

    /// Look up the listed keys in one read transaction
    ///
    /// Keys with no stored value are left out of the result.
    pub fn get<I, K>(&self, keys: I) -> Result<Entries>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let txn = self.db.begin_read().map_err(|e| self.fail("get", e))?;

        let mut found = Entries::new();
        let table = match txn.open_table(bucket(&self.table)) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(found),
            Err(e) => return Err(self.fail("get", e)),
        };

        for key in keys {
            let key = key.as_ref();
            if let Some(value) = table.get(key).map_err(|e| self.fail("get", e))? {
                found.insert(key.to_vec(), value.value().to_vec());
            }
        }

        debug!(table = %self.table, found = found.len(), "got entries");
        Ok(found)
    }

    /// Copy out every entry of the table from one read snapshot
    pub fn get_all(&self) -> Result<Entries> {
        let txn = self.db.begin_read().map_err(|e| self.fail("get_all", e))?;

        let mut all = Entries::new();
        let table = match txn.open_table(bucket(&self.table)) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(all),
            Err(e) => return Err(self.fail("get_all", e)),
        };

        for item in table.iter().map_err(|e| self.fail("get_all", e))? {
            let (key, value) = item.map_err(|e| self.fail("get_all", e))?;
            all.insert(key.value().to_vec(), value.value().to_vec());
        }

        debug!(table = %self.table, count = all.len(), "scanned table");
        Ok(all)
    }

    /// Number of entries in the table; a missing table counts as empty
    pub fn len(&self) -> Result<u64> {
        let txn = self.db.begin_read().map_err(|e| self.fail("len", e))?;

        match txn.open_table(bucket(&self.table)) {
            Ok(table) => table.len().map_err(|e| self.fail("len", e)),
            Err(TableError::TableDoesNotExist(_)) => Ok(0),
            Err(e) => Err(self.fail("len", e)),
        }
    }

    /// Whether the table holds no entries
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub(super) fn fail(&self, op: &'static str, e: impl Into<redb::Error>) -> StoreError {
        StoreError::storage(op, &self.table, e)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("path", &self.path)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}
