//! Whole-file snapshot sync between the local working copy and the
//! remote store.
//!
//! The remote snapshot object is the source of truth between sessions;
//! the local file is a disposable working copy that is overwritten by
//! `pull` at session start and republished by `push` after a committed
//! transaction. Conflict policy is last-write-wins: a push replaces the
//! remote object entirely, with no merge.

use crate::error::{SyncError, SyncResult};
use careerdb_store::ObjectStore;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Keeps the local working file and the remote snapshot consistent at
/// session checkpoints.
pub struct SnapshotSync<S: ObjectStore> {
    store: Arc<S>,
    key: String,
    local_path: PathBuf,
}

impl<S: ObjectStore> SnapshotSync<S> {
    /// Creates a snapshot sync for the object at `key`, working against
    /// the file at `local_path`.
    pub fn new(store: Arc<S>, key: impl Into<String>, local_path: PathBuf) -> Self {
        Self {
            store,
            key: key.into(),
            local_path,
        }
    }

    /// Returns the local working copy path.
    #[must_use]
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Downloads the remote snapshot over the local file.
    ///
    /// If no remote snapshot exists (first run), the local file is
    /// created empty and `Ok(false)` is returned. Otherwise the object
    /// is downloaded to a temporary file and atomically renamed into
    /// place, so the local file is never left half-written, and
    /// `Ok(true)` is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the download or the local write fails.
    pub fn pull(&self) -> SyncResult<bool> {
        let Some(bytes) = self.store.get(&self.key)? else {
            // First-run bootstrap: an empty file is a usable database
            File::create(&self.local_path)?;
            info!(key = %self.key, "no remote snapshot; initialized empty local database");
            return Ok(false);
        };

        let temp_path = self.temp_path();
        let mut file = File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp_path, &self.local_path)?;

        debug!(key = %self.key, bytes = bytes.len(), "pulled snapshot");
        Ok(true)
    }

    /// Uploads the local file as the new remote snapshot.
    ///
    /// Replaces whatever is stored remotely (last-write-wins).
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::LocalMissing`] if there is no local file to
    /// upload - the caller must have pulled or created one first - or a
    /// store error if the upload fails.
    pub fn push(&self) -> SyncResult<()> {
        let bytes = match fs::read(&self.local_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SyncError::LocalMissing {
                    path: self.local_path.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        self.store.put(&self.key, &bytes)?;
        debug!(key = %self.key, bytes = bytes.len(), "pushed snapshot");
        Ok(())
    }

    /// Pulls the latest remote state, then republishes the local file.
    ///
    /// Plain composition of [`pull`](Self::pull) and
    /// [`push`](Self::push) for callers that want to reconcile against
    /// the latest remote state before re-publishing.
    pub fn sync_and_push(&self) -> SyncResult<()> {
        self.pull()?;
        self.push()
    }

    /// Returns the remote snapshot size, or `None` if absent.
    pub fn remote_len(&self) -> SyncResult<Option<u64>> {
        Ok(self.store.get(&self.key)?.map(|b| b.len() as u64))
    }

    /// Returns the local file size, or `None` if absent.
    pub fn local_len(&self) -> SyncResult<Option<u64>> {
        match fs::metadata(&self.local_path) {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        self.local_path.with_file_name(format!(
            "{}.tmp",
            self.local_path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careerdb_store::InMemoryStore;
    use tempfile::tempdir;

    const KEY: &str = "career_data.db";

    fn sync_at(store: &Arc<InMemoryStore>, dir: &Path) -> SnapshotSync<InMemoryStore> {
        SnapshotSync::new(Arc::clone(store), KEY, dir.join(KEY))
    }

    #[test]
    fn pull_bootstraps_empty_local_file() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let sync = sync_at(&store, dir.path());

        let downloaded = sync.pull().unwrap();
        assert!(!downloaded);
        assert_eq!(fs::read(sync.local_path()).unwrap(), b"");
    }

    #[test]
    fn pull_downloads_and_overwrites_local() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryStore::new());
        store.put(KEY, b"remote snapshot bytes").unwrap();

        let sync = sync_at(&store, dir.path());
        fs::write(sync.local_path(), b"stale local junk").unwrap();

        let downloaded = sync.pull().unwrap();
        assert!(downloaded);
        assert_eq!(fs::read(sync.local_path()).unwrap(), b"remote snapshot bytes");
    }

    #[test]
    fn pull_twice_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryStore::new());
        store.put(KEY, b"stable content").unwrap();

        let sync = sync_at(&store, dir.path());
        sync.pull().unwrap();
        let first = fs::read(sync.local_path()).unwrap();
        sync.pull().unwrap();
        let second = fs::read(sync.local_path()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn pull_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryStore::new());
        store.put(KEY, b"content").unwrap();

        let sync = sync_at(&store, dir.path());
        sync.pull().unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from(KEY)]);
    }

    #[test]
    fn push_without_local_file_fails() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let sync = sync_at(&store, dir.path());

        let err = sync.push().unwrap_err();
        assert!(matches!(err, SyncError::LocalMissing { .. }));
        assert!(!store.exists(KEY).unwrap());
    }

    #[test]
    fn push_replaces_remote_snapshot() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryStore::new());
        store.put(KEY, b"old remote").unwrap();

        let sync = sync_at(&store, dir.path());
        fs::write(sync.local_path(), b"new local content").unwrap();

        sync.push().unwrap();
        assert_eq!(store.get(KEY).unwrap().unwrap(), b"new local content");
    }

    #[test]
    fn push_then_pull_round_trips() {
        let store = Arc::new(InMemoryStore::new());

        let dir_a = tempdir().unwrap();
        let sync_a = sync_at(&store, dir_a.path());
        fs::write(sync_a.local_path(), b"session output").unwrap();
        sync_a.push().unwrap();

        // A fresh environment pulls the same bytes
        let dir_b = tempdir().unwrap();
        let sync_b = sync_at(&store, dir_b.path());
        assert!(sync_b.pull().unwrap());
        assert_eq!(fs::read(sync_b.local_path()).unwrap(), b"session output");
    }

    #[test]
    fn sync_and_push_republishes_local() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let sync = sync_at(&store, dir.path());

        // Bootstrap then republish the (empty) local file
        sync.sync_and_push().unwrap();
        assert_eq!(store.get(KEY).unwrap().unwrap(), b"");
    }

    #[test]
    fn lengths_report_presence() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let sync = sync_at(&store, dir.path());

        assert_eq!(sync.remote_len().unwrap(), None);
        assert_eq!(sync.local_len().unwrap(), None);

        store.put(KEY, b"12345").unwrap();
        fs::write(sync.local_path(), b"123").unwrap();

        assert_eq!(sync.remote_len().unwrap(), Some(5));
        assert_eq!(sync.local_len().unwrap(), Some(3));
    }
}
