//! Scoped database sessions over the synchronized snapshot.
//!
//! [`SessionManager`] is the only entry point automation code should use
//! to touch the shared database. One session is one complete
//! acquire → pull → transact → push → release cycle:
//!
//! ```text
//! Idle -> Locking -> {LockFailed}
//!               | -> Locked -> Syncing -> {SyncFailed, lock released}
//!                         | -> Ready -> InTransaction
//!                                   -> {Committed -> Pushing -> Released}
//!                                   -> {RolledBack -> Released}
//! ```
//!
//! "Released" is reached from every branch after acquisition; it is the
//! only state from which the lock is guaranteed absent.

use crate::config::DbConfig;
use crate::error::{SessionError, SessionResult, SyncPhase};
use crate::lock::{LockManager, LockMarker};
use crate::snapshot::SnapshotSync;
use careerdb_store::ObjectStore;
use rusqlite::Connection;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// State of the lock marker as seen by [`SessionManager::status`].
#[derive(Debug, Clone)]
pub struct LockStatus {
    /// Best-effort identity of the marker's creator.
    pub holder: String,
    /// How old the marker is.
    pub age: Duration,
    /// Whether the marker has outlived the staleness threshold.
    pub stale: bool,
}

/// Read-only report of the shared database state.
#[derive(Debug, Clone)]
pub struct DbStatus {
    /// The current lock marker, if any.
    pub lock: Option<LockStatus>,
    /// Remote snapshot size in bytes, or `None` if absent.
    pub remote_len: Option<u64>,
    /// Local working copy size in bytes, or `None` if absent.
    pub local_len: Option<u64>,
}

/// Composes the lock manager and snapshot sync around a local SQLite
/// transaction as one scoped-acquisition unit.
///
/// The local working file is private per process and disposable: it is
/// re-pulled at the start of every session, and the connection handle is
/// opened fresh per session because the file may have changed underneath
/// since the last one.
pub struct SessionManager<S: ObjectStore> {
    lock: LockManager<S>,
    snapshot: SnapshotSync<S>,
    config: DbConfig,
}

impl<S: ObjectStore> SessionManager<S> {
    /// Creates a session manager over `store` with the given
    /// configuration.
    ///
    /// The store is shared via `Arc` so status readers and tests can
    /// hold their own handle to the same bucket.
    pub fn new(store: Arc<S>, config: DbConfig) -> Self {
        let lock = LockManager::new(Arc::clone(&store), config.lock_key(), config.lock.clone());
        let snapshot = SnapshotSync::new(store, config.snapshot_key.clone(), config.local_path.clone());
        Self {
            lock,
            snapshot,
            config,
        }
    }

    /// Returns the configuration this manager was built with.
    #[must_use]
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Runs `f` inside one complete session.
    ///
    /// The sequence is: acquire the lock, pull the remote snapshot, open
    /// a fresh connection against the local file, begin a transaction,
    /// and hand it to `f`. If `f` returns `Ok`, the transaction is
    /// committed and the local file is pushed as the new remote
    /// snapshot; if `f` returns `Err`, the transaction is rolled back
    /// and nothing is pushed. The lock is released on every path after
    /// acquisition.
    ///
    /// # Errors
    ///
    /// - [`SessionError::LockUnavailable`]: the retry budget ran out;
    ///   nothing was touched and the whole session may be retried later
    /// - [`SessionError::Sync`] with [`SyncPhase::Pull`]: the download
    ///   failed; the lock was released and no local state was trusted
    /// - [`SessionError::Transaction`]: `f` or the local engine failed;
    ///   rolled back, not pushed
    /// - [`SessionError::Sync`] with [`SyncPhase::Push`]: the local
    ///   commit succeeded but the upload failed - the remote snapshot
    ///   is stale until the next successful push, and the lock was
    ///   still released
    pub fn with_session<T, F>(&self, f: F) -> SessionResult<T>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> SessionResult<T>,
    {
        let guard = self.lock.acquire()?;
        debug!(key = %self.config.snapshot_key, "session started");

        self.snapshot
            .pull()
            .map_err(|e| SessionError::sync(SyncPhase::Pull, e))?;

        // Fresh engine handle per session: the file content just changed
        let mut conn = Connection::open(self.snapshot.local_path())?;
        let tx = conn.transaction()?;

        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                // Close the engine before publishing the file
                drop(conn);

                if let Err(e) = self.snapshot.push() {
                    error!(
                        key = %self.config.snapshot_key,
                        "local commit succeeded but snapshot push failed; \
                         remote copy is stale until the next successful push: {e}"
                    );
                    return Err(SessionError::sync(SyncPhase::Push, e));
                }

                if let Err(e) = guard.release() {
                    // The staleness threshold is the safety net here
                    warn!(
                        key = %self.config.snapshot_key,
                        "session succeeded but lock release failed: {e}"
                    );
                }
                debug!(key = %self.config.snapshot_key, "session committed and pushed");
                Ok(value)
            }
            Err(err) => {
                // Rollback on drop; push is skipped so the remote
                // snapshot is untouched
                drop(tx);
                drop(conn);
                debug!(key = %self.config.snapshot_key, "session rolled back");
                Err(err)
            }
        }
    }

    /// Downloads the latest snapshot without running a transaction.
    ///
    /// Lock-guarded pull, for warming a fresh environment. Returns
    /// whether a snapshot was downloaded (`false` means first-run
    /// bootstrap).
    ///
    /// # Errors
    ///
    /// Same lock and pull errors as [`with_session`](Self::with_session).
    pub fn sync_db(&self) -> SessionResult<bool> {
        let _guard = self.lock.acquire()?;
        let downloaded = self
            .snapshot
            .pull()
            .map_err(|e| SessionError::sync(SyncPhase::Pull, e))?;
        info!(
            key = %self.config.snapshot_key,
            downloaded, "database synchronized"
        );
        Ok(downloaded)
    }

    /// Removes the lock marker regardless of age.
    ///
    /// Administrative override; unsafe if another session is genuinely
    /// active.
    ///
    /// # Errors
    ///
    /// Returns an error if the store delete fails.
    pub fn force_unlock(&self) -> SessionResult<()> {
        self.lock.force_unlock().map_err(SessionError::from)
    }

    /// Reports lock, remote snapshot, and local working copy state
    /// without mutating anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the store or local metadata reads fail.
    pub fn status(&self) -> SessionResult<DbStatus> {
        let lock = self
            .lock
            .peek()?
            .map(|(LockMarker { holder, .. }, age)| LockStatus {
                holder,
                age,
                stale: age > self.config.lock.staleness_threshold,
            });

        let remote_len = self
            .snapshot
            .remote_len()
            .map_err(|e| SessionError::sync(SyncPhase::Pull, e))?;
        let local_len = self
            .snapshot
            .local_len()
            .map_err(|e| SessionError::sync(SyncPhase::Pull, e))?;

        Ok(DbStatus {
            lock,
            remote_len,
            local_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LockConfig;
    use careerdb_store::InMemoryStore;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    const KEY: &str = "career_data.db";
    const LOCK_KEY: &str = "career_data.db.lock";

    fn manager_at(store: &Arc<InMemoryStore>, dir: &Path) -> SessionManager<InMemoryStore> {
        let config = DbConfig::new("test-bucket")
            .local_path(dir.join(KEY))
            .lock(
                LockConfig::new()
                    .max_attempts(3)
                    .retry_delay(Duration::from_millis(5)),
            );
        SessionManager::new(Arc::clone(store), config)
    }

    #[test]
    fn commit_publishes_snapshot_and_releases_lock() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let manager = manager_at(&store, dir.path());

        manager
            .with_session(|tx| {
                tx.execute("CREATE TABLE jobs (company TEXT NOT NULL)", ())?;
                tx.execute("INSERT INTO jobs (company) VALUES ('Initech')", ())?;
                Ok(())
            })
            .unwrap();

        let remote = store.get(KEY).unwrap().unwrap();
        assert!(!remote.is_empty());
        assert!(!store.exists(LOCK_KEY).unwrap());
    }

    #[test]
    fn failed_body_rolls_back_and_skips_push() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let manager = manager_at(&store, dir.path());

        // Seed the remote snapshot with one committed row
        manager
            .with_session(|tx| {
                tx.execute("CREATE TABLE jobs (company TEXT NOT NULL)", ())?;
                tx.execute("INSERT INTO jobs (company) VALUES ('Initech')", ())?;
                Ok(())
            })
            .unwrap();
        let before = store.get(KEY).unwrap().unwrap();

        // A failing body must leave the remote snapshot byte-identical
        let err = manager
            .with_session::<(), _>(|tx| {
                tx.execute("INSERT INTO jobs (company) VALUES ('Globex')", ())?;
                tx.execute("INSERT INTO no_such_table (x) VALUES (1)", ())?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, SessionError::Transaction(_)));

        assert_eq!(store.get(KEY).unwrap().unwrap(), before);
        assert!(!store.exists(LOCK_KEY).unwrap());

        // And the uncommitted row is gone for the next session
        let count: i64 = manager
            .with_session(|tx| {
                Ok(tx.query_row("SELECT COUNT(*) FROM jobs", (), |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn lock_unavailable_aborts_before_touching_local_state() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let manager = manager_at(&store, dir.path());

        // Another process holds the lock
        let holder = LockManager::new(
            Arc::clone(&store),
            LOCK_KEY,
            LockConfig::new().max_attempts(1),
        );
        let held = holder.acquire().unwrap();

        let err = manager
            .with_session::<(), _>(|_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, SessionError::LockUnavailable { attempts: 3 }));

        // Never pulled, never created the local file
        assert!(!dir.path().join(KEY).exists());
        held.release().unwrap();
    }

    #[test]
    fn sync_db_pulls_without_transacting() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryStore::new());
        store.put(KEY, b"remote bytes").unwrap();

        let manager = manager_at(&store, dir.path());
        assert!(manager.sync_db().unwrap());

        assert_eq!(fs::read(dir.path().join(KEY)).unwrap(), b"remote bytes");
        assert!(!store.exists(LOCK_KEY).unwrap());
    }

    #[test]
    fn sync_db_bootstraps_on_first_run() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let manager = manager_at(&store, dir.path());

        assert!(!manager.sync_db().unwrap());
        assert_eq!(fs::read(dir.path().join(KEY)).unwrap(), b"");
        assert!(!store.exists(LOCK_KEY).unwrap());
    }

    #[test]
    fn force_unlock_clears_marker() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let manager = manager_at(&store, dir.path());

        let holder = LockManager::new(
            Arc::clone(&store),
            LOCK_KEY,
            LockConfig::new().max_attempts(1),
        );
        let held = holder.acquire().unwrap();
        std::mem::forget(held);

        manager.force_unlock().unwrap();
        assert!(!store.exists(LOCK_KEY).unwrap());
    }

    #[test]
    fn status_reports_all_three_resources() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let manager = manager_at(&store, dir.path());

        let status = manager.status().unwrap();
        assert!(status.lock.is_none());
        assert_eq!(status.remote_len, None);
        assert_eq!(status.local_len, None);

        manager
            .with_session(|tx| {
                tx.execute("CREATE TABLE jobs (company TEXT NOT NULL)", ())?;
                Ok(())
            })
            .unwrap();

        let status = manager.status().unwrap();
        assert!(status.lock.is_none());
        assert!(status.remote_len.unwrap() > 0);
        assert_eq!(status.remote_len, status.local_len);
    }

    #[test]
    fn retryable_lock_error_reports_attempt_budget() {
        let store = Arc::new(InMemoryStore::new());
        let lock = LockManager::new(
            Arc::clone(&store),
            LOCK_KEY,
            LockConfig::new()
                .max_attempts(2)
                .retry_delay(Duration::from_millis(1)),
        );
        let _held = lock.acquire().unwrap();

        let waiter = LockManager::new(
            Arc::clone(&store),
            LOCK_KEY,
            LockConfig::new()
                .max_attempts(2)
                .retry_delay(Duration::from_millis(1)),
        );
        let err: SessionError = waiter.acquire().map(|_| ()).unwrap_err().into();
        assert!(err.is_retryable());
        assert!(matches!(err, SessionError::LockUnavailable { attempts: 2 }));
    }
}
