//! Store Module
//!
//! Table-scoped access to a single-file redb database.
//!
//! ## Responsibilities
//! - Open the file under a bounded wait for the OS file lock
//! - Share one open handle per file among callers in this process
//! - Create tables on explicit ensure or on first write; reads never create
//! - One transaction per call: batched writes, point and full reads
//! - Consistent, optionally verified backups of the whole file
//!
//! ## Handle Lifecycle
//! ```text
//!   Store::set / get / ...          Store::session()
//!   ┌──────────────────────┐        ┌──────────────────────┐
//!   │ join or open handle  │        │ join or open handle  │
//!   │ one transaction      │        ├──────────────────────┤
//!   │ release handle       │        │ call → 1 transaction │
//!   └──────────────────────┘        │ call → 1 transaction │
//!                                   │ ...                  │
//!                                   │ drop → release       │
//!                                   └──────────────────────┘
//!
//!   The file closes when the last holder in the process releases it.
//! ```

mod backup;
mod bucket;
mod digest;
mod handle;
mod session;

use std::collections::BTreeMap;

pub use backup::BackupReport;
pub use bucket::Store;
pub use session::Session;

/// Owned copies of table entries, ordered by key
pub type Entries = BTreeMap<Vec<u8>, Vec<u8>>;
