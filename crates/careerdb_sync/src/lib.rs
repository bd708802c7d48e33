//! # CareerDB Sync
//!
//! Lock-coordinated snapshot sync and database sessions for CareerDB.
//!
//! This crate provides:
//! - Advisory lock marker over the object store, with staleness recovery
//! - Whole-file snapshot pull/push between the local SQLite file and the
//!   remote store (last-write-wins)
//! - Scoped database sessions composing lock, sync, and a local
//!   transaction with guaranteed release on every exit path
//! - Configuration resolved once at startup
//!
//! ## Architecture
//!
//! Independent automation jobs (CI runs, local CLI invocations) share one
//! database by treating the remote snapshot object as the source of truth
//! and the local file as a disposable working copy:
//!
//! 1. Acquire the lock marker (bounded retry, stale markers removed)
//! 2. Pull the remote snapshot over the local file
//! 3. Open a fresh connection and run the caller's transaction
//! 4. On commit, push the local file back; on error, roll back and skip
//!    the push
//! 5. Release the lock on every path
//!
//! ## Key Invariants
//!
//! - The remote snapshot is authoritative between sessions
//! - The local file is only trustworthy while the lock is held
//! - The push happens if and only if the local transaction committed
//! - The lock is released exactly once per session regardless of outcome
//! - Connections are opened fresh per session, never reused across them
//!
//! ## Example
//!
//! ```no_run
//! use careerdb_store::FsStore;
//! use careerdb_sync::{DbConfig, SessionManager};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(FsStore::open(Path::new("/mnt/career-bucket"))?);
//! let manager = SessionManager::new(store, DbConfig::new("career-bucket"));
//!
//! manager.with_session(|tx| {
//!     tx.execute(
//!         "INSERT INTO jobs (company, title) VALUES (?1, ?2)",
//!         ("Initech", "Staff Engineer"),
//!     )?;
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod lock;
mod session;
mod snapshot;

pub use config::{DbConfig, LockConfig, BUCKET_ENV, LOCAL_PATH_ENV, SNAPSHOT_KEY_ENV};
pub use error::{
    ConfigError, LockError, LockResult, SessionError, SessionResult, SyncError, SyncPhase,
    SyncResult,
};
pub use lock::{LockGuard, LockManager, LockMarker};
pub use session::{DbStatus, LockStatus, SessionManager};
pub use snapshot::SnapshotSync;

/// Re-export of the embedded database engine used inside sessions.
pub use rusqlite;
