//! Backup
//!
//! Point-in-time copy of every table in the file.
//!
//! ## Procedure
//! ```text
//!   source (held open)            <dest>.partial              <dest>
//!   ┌──────────────┐  one read   ┌──────────────┐  rename   ┌──────────────┐
//!   │ read txn     │ ──────────▶ │ write txn    │ ────────▶ │ backup file  │
//!   │ (snapshot)   │  + digest   │ + re-digest  │           │              │
//!   └──────────────┘             └──────────────┘           └──────────────┘
//! ```
//! The source is only read: no table or file is created on its side.
//!
//! With `StoreConfig::verify_backups` set (the default), the digest taken
//! while copying must match the digest of the reopened partial file before it
//! is renamed into place. That re-read catches corruption introduced by the
//! engine or the disk while writing, and costs a second full read of the
//! copy; turn it off when backups are large and the checksum in the report
//! is enough. Any failure removes the partial file.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use redb::{Database, ReadTransaction, ReadableTable, TableHandle};
use tracing::{debug, warn};

use crate::error::{Result, StoreError};

use super::digest::Digest;
use super::handle::bucket;
use super::Session;

/// Outcome of a successful backup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    /// Where the backup was written
    pub path: PathBuf,
    /// Number of tables copied
    pub tables: usize,
    /// Number of entries copied across all tables
    pub entries: u64,
    /// CRC32 over every copied (table, key, value)
    pub checksum: u32,
}

impl Session {
    /// Write a consistent copy of the whole file to `dest`
    ///
    /// The copy reflects the state at the start of one read transaction.
    /// An existing file at `dest` is replaced; a missing parent directory is
    /// an error.
    pub fn backup(&self, dest: impl AsRef<Path>) -> Result<BackupReport> {
        let dest = dest.as_ref();
        let partial = partial_path(dest);

        let snapshot = self.db.begin_read().map_err(|e| self.fail("backup", e))?;

        let outcome = self
            .write_verified(&snapshot, &partial)
            .and_then(|stats| {
                fs::rename(&partial, dest)?;
                Ok(stats)
            });

        match outcome {
            Ok((tables, entries, checksum)) => {
                let report = BackupReport {
                    path: dest.to_path_buf(),
                    tables,
                    entries,
                    checksum,
                };
                debug!(
                    dest = %dest.display(),
                    tables = report.tables,
                    entries = report.entries,
                    "backup written"
                );
                Ok(report)
            }
            Err(e) => {
                if let Err(cleanup) = remove_if_present(&partial) {
                    warn!(partial = %partial.display(), error = %cleanup, "failed to remove partial backup");
                }
                Err(e)
            }
        }
    }

    /// Copy every table into a fresh database at `partial`, then check it
    /// when verification is on
    ///
    /// Returns the table count, entry count and checksum of the copy.
    fn write_verified(
        &self,
        snapshot: &ReadTransaction,
        partial: &Path,
    ) -> Result<(usize, u64, u32)> {
        remove_if_present(partial)?;

        let mut names: Vec<String> = snapshot
            .list_tables()
            .map_err(|e| self.fail("backup", e))?
            .map(|handle| handle.name().to_string())
            .collect();
        names.sort();

        let mut copied = Digest::new();
        {
            let target = Database::create(partial).map_err(|e| self.fail("backup", e))?;
            let txn = target.begin_write().map_err(|e| self.fail("backup", e))?;

            for name in &names {
                let source = snapshot
                    .open_table(bucket(name))
                    .map_err(|e| self.fail("backup", e))?;
                let mut sink = txn
                    .open_table(bucket(name))
                    .map_err(|e| self.fail("backup", e))?;

                copied.table(name);
                for item in source.iter().map_err(|e| self.fail("backup", e))? {
                    let (key, value) = item.map_err(|e| self.fail("backup", e))?;
                    sink.insert(key.value(), value.value())
                        .map_err(|e| self.fail("backup", e))?;
                    copied.entry(key.value(), value.value());
                }
            }

            txn.commit().map_err(|e| self.fail("backup", e))?;
        }

        let entries = copied.entries();
        let expected = copied.finish();
        if self.verify_backups {
            let actual = self.digest_file(partial, &names)?;
            if expected != actual {
                return Err(StoreError::BackupVerification {
                    path: partial.to_path_buf(),
                    expected,
                    actual,
                });
            }
        }

        Ok((names.len(), entries, expected))
    }

    /// Digest of the named tables in the database file at `path`
    fn digest_file(&self, path: &Path, names: &[String]) -> Result<u32> {
        let db = Database::open(path).map_err(|e| self.fail("backup_verify", e))?;
        let txn = db.begin_read().map_err(|e| self.fail("backup_verify", e))?;

        let mut digest = Digest::new();
        for name in names {
            let table = txn
                .open_table(bucket(name))
                .map_err(|e| self.fail("backup_verify", e))?;

            digest.table(name);
            for item in table.iter().map_err(|e| self.fail("backup_verify", e))? {
                let (key, value) = item.map_err(|e| self.fail("backup_verify", e))?;
                digest.entry(key.value(), value.value());
            }
        }

        Ok(digest.finish())
    }
}

/// `<dest>.partial`, next to the destination
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
