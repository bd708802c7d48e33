//! Advisory lock marker over the object store.
//!
//! Mutual exclusion between independent automation jobs is signalled by
//! the mere existence of a small remote object (the lock marker). The
//! marker carries its creation timestamp so that a crashed holder's
//! marker can be detected as stale and removed by the next acquirer.

use crate::config::LockConfig;
use crate::error::{LockError, LockResult};
use careerdb_store::ObjectStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use uuid::Uuid;

/// The lock marker document stored at the lock key.
///
/// Holder identity is best-effort diagnostic information; the timestamp
/// is what staleness detection relies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockMarker {
    /// Best-effort identity of the process that created the marker.
    pub holder: String,
    /// Creation time, seconds since the Unix epoch.
    pub acquired_at: u64,
}

impl LockMarker {
    /// Creates a marker for the current process, stamped with the
    /// current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            holder: format!("{}#{}", Uuid::new_v4(), std::process::id()),
            acquired_at: now_secs(),
        }
    }

    /// Creates a marker with an explicit timestamp.
    ///
    /// Useful for constructing aged markers in staleness tests.
    #[must_use]
    pub fn with_timestamp(holder: impl Into<String>, acquired_at: u64) -> Self {
        Self {
            holder: holder.into(),
            acquired_at,
        }
    }

    /// Returns the marker's age relative to the current clock.
    ///
    /// A marker stamped in the future reads as age zero.
    #[must_use]
    pub fn age(&self) -> Duration {
        Duration::from_secs(now_secs().saturating_sub(self.acquired_at))
    }
}

impl Default for LockMarker {
    fn default() -> Self {
        Self::new()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Outcome of a single acquisition attempt.
enum Attempt {
    Acquired,
    StaleRemoved,
    Held,
}

/// Acquires and releases the lock marker with bounded retry.
///
/// This is advisory, best-effort mutual exclusion built on plain
/// exists/put/delete: two processes can still race between the existence
/// check and the marker write, since the store contract offers no
/// conditional put. The window is small and accepted as a pragmatic
/// trade-off; the staleness threshold is the recovery path for markers
/// left behind by crashed holders.
pub struct LockManager<S: ObjectStore> {
    store: Arc<S>,
    key: String,
    config: LockConfig,
}

impl<S: ObjectStore> LockManager<S> {
    /// Creates a lock manager for the marker at `key`.
    pub fn new(store: Arc<S>, key: impl Into<String>, config: LockConfig) -> Self {
        Self {
            store,
            key: key.into(),
            config,
        }
    }

    /// Returns the remote key of the lock marker.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Acquires the lock, retrying up to the configured attempt budget.
    ///
    /// Each attempt writes a fresh marker if none exists. A marker older
    /// than the staleness threshold (or one whose content cannot be
    /// parsed) is removed and acquisition retries immediately; a fresh
    /// marker causes a sleep of `retry_delay` before the next attempt.
    /// Stale-marker removal is counted against the same attempt budget,
    /// so the call is always bounded.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Unavailable`] once attempts are exhausted, or
    /// a store error if the marker bookkeeping itself fails.
    pub fn acquire(&self) -> LockResult<LockGuard<'_, S>> {
        let attempts = self.config.max_attempts.max(1);

        for attempt in 1..=attempts {
            match self.try_acquire_once()? {
                Attempt::Acquired => {
                    debug!(key = %self.key, attempt, "lock acquired");
                    return Ok(LockGuard {
                        manager: self,
                        released: false,
                    });
                }
                Attempt::StaleRemoved => {
                    // Marker gone; retry immediately within the budget
                    continue;
                }
                Attempt::Held => {
                    if attempt < attempts {
                        thread::sleep(self.config.retry_delay);
                    }
                }
            }
        }

        Err(LockError::Unavailable { attempts })
    }

    fn try_acquire_once(&self) -> LockResult<Attempt> {
        if !self.store.exists(&self.key)? {
            let marker = LockMarker::new();
            let body = serde_json::to_vec(&marker)?;
            self.store.put(&self.key, &body)?;
            return Ok(Attempt::Acquired);
        }

        let Some(bytes) = self.store.get(&self.key)? else {
            // Marker vanished between the check and the read
            return Ok(Attempt::StaleRemoved);
        };

        match serde_json::from_slice::<LockMarker>(&bytes) {
            Ok(marker) => {
                let age = marker.age();
                if age > self.config.staleness_threshold {
                    warn!(
                        key = %self.key,
                        holder = %marker.holder,
                        age_secs = age.as_secs(),
                        "removing stale lock marker"
                    );
                    self.store.delete(&self.key)?;
                    Ok(Attempt::StaleRemoved)
                } else {
                    Ok(Attempt::Held)
                }
            }
            Err(_) => {
                // A marker that cannot prove its age cannot prove its
                // freshness
                warn!(key = %self.key, "removing unparseable lock marker");
                self.store.delete(&self.key)?;
                Ok(Attempt::StaleRemoved)
            }
        }
    }

    /// Releases the lock by deleting the marker.
    ///
    /// Releasing an already-absent marker is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store delete itself fails.
    pub fn release(&self) -> LockResult<()> {
        self.store.delete(&self.key)?;
        debug!(key = %self.key, "lock released");
        Ok(())
    }

    /// Removes the marker regardless of age.
    ///
    /// Administrative override; unsafe if another session is genuinely
    /// active. Ordinary code paths go through [`acquire`](Self::acquire)
    /// and its staleness checks instead.
    pub fn force_unlock(&self) -> LockResult<()> {
        warn!(key = %self.key, "force-unlocking");
        self.store.delete(&self.key)?;
        Ok(())
    }

    /// Reads the current marker and its age without mutating anything.
    ///
    /// Returns `None` if no marker exists or its content cannot be
    /// parsed.
    pub fn peek(&self) -> LockResult<Option<(LockMarker, Duration)>> {
        let Some(bytes) = self.store.get(&self.key)? else {
            return Ok(None);
        };
        Ok(serde_json::from_slice::<LockMarker>(&bytes)
            .ok()
            .map(|marker| {
                let age = marker.age();
                (marker, age)
            }))
    }
}

/// Holds the lock for the duration of a session.
///
/// Dropping the guard releases the lock best-effort; use
/// [`release`](Self::release) when the caller wants release failures
/// surfaced. Either way the marker is deleted at most once per guard.
pub struct LockGuard<'a, S: ObjectStore> {
    manager: &'a LockManager<S>,
    released: bool,
}

impl<S: ObjectStore> std::fmt::Debug for LockGuard<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("key", &self.manager.key)
            .field("released", &self.released)
            .finish()
    }
}

impl<S: ObjectStore> LockGuard<'_, S> {
    /// Releases the lock, consuming the guard.
    ///
    /// # Errors
    ///
    /// Returns an error if the store delete fails; the drop path will
    /// not retry.
    pub fn release(mut self) -> LockResult<()> {
        self.released = true;
        self.manager.release()
    }
}

impl<S: ObjectStore> Drop for LockGuard<'_, S> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.manager.release() {
                warn!(key = %self.manager.key, "failed to release lock on drop: {e}");
            }
        }
    }
}
