//! # kvbucket
//!
//! An embedded key-value store over a single redb file:
//! - Named tables (buckets) of raw byte keys and values
//! - One transaction per call, all-or-nothing writes
//! - Bounded wait on the OS file lock instead of blocking forever
//! - Verified point-in-time backups
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Store                                │
//! │          (path + table, open-per-call façade)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ session()
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Session                               │
//! │    (shared open handle, one transaction per call)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  redb file  │          │   Backup    │
//!   │ (B-tree,    │          │ (snapshot + │
//!   │  file lock) │          │   CRC32)    │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use kvbucket::Store;
//!
//! let store = Store::new("/tmp/kvbucket/data.redb", "token")?;
//! store.set([("root", "123")])?;
//!
//! let found = store.get(["root"])?;
//! assert_eq!(found.get(b"root".as_slice()), Some(&b"123".to_vec()));
//! # Ok::<(), kvbucket::StoreError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ErrorKind, Result, StoreError};
pub use config::{StoreConfig, StoreConfigBuilder};
pub use store::{BackupReport, Entries, Session, Store};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvbucket
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
