//! Database Handle
//!
//! Opens the database file under a bounded lock wait and resolves tables.
//!
//! redb takes an exclusive OS lock on the file for as long as a `Database`
//! value lives, so a second open fails with `DatabaseAlreadyOpen` until the
//! first handle is dropped. Two consequences shape this module:
//!
//! - Within one process, callers on the same file share a single handle
//!   through a registry of weak references. Readers then run side by side on
//!   MVCC snapshots and writers queue on redb's own write lock. The handle is
//!   dropped, and the file closed, once the last call using it returns.
//! - Across processes, the open is retried with jittered sleeps until
//!   `lock_timeout` elapses.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::Rng;
use redb::{Database, DatabaseError, TableDefinition};
use tracing::trace;

use crate::error::{Result, StoreError};

/// Layout shared by every table in the file: raw bytes to raw bytes
pub(crate) type BucketDef<'a> = TableDefinition<'a, &'static [u8], &'static [u8]>;

/// Table definition for a bucket name
pub(crate) fn bucket(name: &str) -> BucketDef<'_> {
    TableDefinition::new(name)
}

/// Handles open in this process, keyed by resolved file path
///
/// Only weak references are kept: an entry never keeps a file open.
static OPEN_FILES: Mutex<BTreeMap<PathBuf, Weak<Database>>> =
    parking_lot::const_mutex(BTreeMap::new());

/// Whether an open may create a missing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpenMode {
    /// Create the file if absent
    Create,
    /// Fail if the file does not exist
    Existing,
}

/// Open the database at `path`, or join the handle another call holds
///
/// Retries roughly every `retry_interval` (±50% jitter) while another
/// process holds the lock and gives up with `LockTimeout` once
/// `lock_timeout` has elapsed. A zero timeout makes exactly one attempt.
pub(crate) fn acquire(
    path: &Path,
    table: &str,
    mode: OpenMode,
    lock_timeout: Duration,
    retry_interval: Duration,
) -> Result<Arc<Database>> {
    let key = file_key(path);
    let started = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;

        {
            let mut open = OPEN_FILES.lock();

            if let Some(db) = open.get(&key).and_then(Weak::upgrade) {
                trace!(path = %path.display(), "joined open database");
                return Ok(db);
            }

            let opened = match mode {
                OpenMode::Create => Database::create(path),
                OpenMode::Existing => Database::open(path),
            };

            match opened {
                Ok(db) => {
                    let db = Arc::new(db);
                    open.retain(|_, handle| handle.strong_count() > 0);
                    open.insert(key, Arc::downgrade(&db));
                    trace!(path = %path.display(), attempts, "opened database");
                    return Ok(db);
                }
                // Held by another process, or still closing after its last user
                Err(DatabaseError::DatabaseAlreadyOpen) => {}
                Err(e) => return Err(StoreError::storage("open", table, e)),
            }
        }

        let waited = started.elapsed();
        if waited >= lock_timeout {
            return Err(StoreError::LockTimeout {
                path: path.to_path_buf(),
                waited,
            });
        }
        thread::sleep(jittered(retry_interval).min(lock_timeout - waited));
    }
}

/// Create `table` inside one write transaction unless it already exists
pub(crate) fn ensure_bucket(db: &Database, table: &str) -> Result<()> {
    let txn = db
        .begin_write()
        .map_err(|e| StoreError::storage("ensure_table", table, e))?;

    // open_table creates the table on first use
    txn.open_table(bucket(table))
        .map_err(|e| StoreError::storage("ensure_table", table, e))?;

    txn.commit()
        .map_err(|e| StoreError::storage("ensure_table", table, e))
}

/// Registry key: canonical parent directory joined with the file name
///
/// The parent exists once a `Store` is constructed, so different spellings
/// of the same location map to one entry even before the file exists.
fn file_key(path: &Path) -> PathBuf {
    let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
        return path.to_path_buf();
    };
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };

    fs::canonicalize(dir)
        .map(|dir| dir.join(name))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Spread waiters out so they do not all retry at the same instant
fn jittered(interval: Duration) -> Duration {
    interval.mul_f64(rand::thread_rng().gen_range(0.5..1.5))
}
