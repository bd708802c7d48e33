//! Error types for the sync layer.

use careerdb_store::StoreError;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;

/// Result type for snapshot sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Result type for database sessions.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur while acquiring or releasing the lock marker.
#[derive(Debug, Error)]
pub enum LockError {
    /// Acquisition exhausted its retry budget while another holder was
    /// active. The whole session can be retried later.
    #[error("lock unavailable after {attempts} attempts")]
    Unavailable {
        /// How many acquisition attempts were made.
        attempts: u32,
    },

    /// The object store failed underneath the lock bookkeeping.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The lock marker document could not be encoded.
    #[error("lock marker encoding failed: {0}")]
    Marker(#[from] serde_json::Error),
}

/// Errors that can occur while pulling or pushing the snapshot.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The object store failed during the transfer.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Local file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Push was attempted with no local file to upload.
    #[error("local database file missing: {path}")]
    LocalMissing {
        /// The expected local working copy path.
        path: PathBuf,
    },
}

/// Which sync checkpoint a failure occurred at.
///
/// A pull failure aborts the session before any local state is trusted.
/// A push failure happens after a successful local commit and leaves the
/// remote snapshot stale until the next successful push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Downloading the remote snapshot at session start.
    Pull,
    /// Uploading the local file after a committed transaction.
    Push,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPhase::Pull => write!(f, "pull"),
            SyncPhase::Push => write!(f, "push"),
        }
    }
}

/// Errors raised while resolving configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The bucket location was not configured. Fatal at startup, never
    /// retried.
    #[error("missing bucket configuration: set {var}")]
    MissingBucket {
        /// The environment variable that was expected.
        var: &'static str,
    },
}

/// Errors that can occur during a database session.
///
/// The kinds are deliberately distinct so calling automation can pick a
/// remediation: back off and retry the whole session (lock contention,
/// pull failure), fail the run (transaction, configuration), or alert a
/// human (push divergence after a local commit).
#[derive(Debug, Error)]
pub enum SessionError {
    /// Lock acquisition exhausted its retry budget. No state was touched;
    /// the caller may retry the entire session later.
    #[error("lock unavailable after {attempts} attempts")]
    LockUnavailable {
        /// How many acquisition attempts were made.
        attempts: u32,
    },

    /// Lock bookkeeping failed for a reason other than contention.
    #[error("lock error: {0}")]
    Lock(LockError),

    /// Snapshot transfer failed during the named phase.
    #[error("sync failed during {phase}: {source}")]
    Sync {
        /// The checkpoint that failed.
        phase: SyncPhase,
        /// The underlying transfer failure.
        #[source]
        source: SyncError,
    },

    /// The caller's transaction body or the local engine failed. The
    /// transaction was rolled back and nothing was pushed.
    #[error("transaction error: {0}")]
    Transaction(#[from] rusqlite::Error),

    /// Configuration could not be resolved at startup.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<LockError> for SessionError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Unavailable { attempts } => Self::LockUnavailable { attempts },
            other => Self::Lock(other),
        }
    }
}

impl SessionError {
    /// Creates a sync error tagged with the failed phase.
    pub fn sync(phase: SyncPhase, source: SyncError) -> Self {
        Self::Sync { phase, source }
    }

    /// Returns true if retrying the whole session later may succeed.
    ///
    /// Push divergence is deliberately not retryable here: the local
    /// commit already happened, so blind re-runs would repeat it. That
    /// case needs an operator (or the next session's push) instead.
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::LockUnavailable { .. } => true,
            SessionError::Lock(_) => true,
            SessionError::Sync { phase, .. } => *phase == SyncPhase::Pull,
            SessionError::Transaction(_) => false,
            SessionError::Config(_) => false,
        }
    }
}
