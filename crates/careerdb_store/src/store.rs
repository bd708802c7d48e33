//! Object store trait definition.

use crate::error::StoreResult;

/// A remote object store for CareerDB.
///
/// Stores are **opaque blob buckets**. They hold whole objects addressed
/// by string keys and provide simple operations for reading, replacing,
/// and removing them. The sync layer owns all interpretation - stores do
/// not understand snapshots or lock markers.
///
/// # Invariants
///
/// - `put` replaces the full object under `key`; readers never observe a
///   partially written object
/// - `get` returns `None` for a missing key rather than an error
/// - `delete` is idempotent; removing a missing key succeeds
/// - Stores must be `Send + Sync` so independent managers can share one
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing
/// - [`super::FsStore`] - A directory acting as the bucket
pub trait ObjectStore: Send + Sync {
    /// Returns whether an object exists under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the existence check itself fails.
    fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Reads the full object stored under `key`.
    ///
    /// Returns `None` if no object exists - absence is an expected
    /// steady state (first run), not a failure.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs while reading.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Writes `bytes` as the full object under `key`.
    ///
    /// Replaces any existing object entirely. After this returns
    /// successfully, a subsequent `get` observes exactly `bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the write fails.
    fn put(&self, key: &str, bytes: &[u8]) -> StoreResult<()>;

    /// Deletes the object under `key`.
    ///
    /// Deleting a missing key is a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only for actual I/O failures.
    fn delete(&self, key: &str) -> StoreResult<()>;

    /// Lists keys beginning with `prefix`, sorted.
    ///
    /// An empty prefix lists every key in the bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    fn list(&self, prefix: &str) -> StoreResult<Vec<String>>;
}
