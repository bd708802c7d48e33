//! Configuration for the shared database.

use crate::error::ConfigError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the bucket/location of the remote store.
pub const BUCKET_ENV: &str = "CAREERDB_BUCKET";

/// Environment variable overriding the remote snapshot key.
pub const SNAPSHOT_KEY_ENV: &str = "CAREERDB_SNAPSHOT_KEY";

/// Environment variable overriding the local working copy path.
pub const LOCAL_PATH_ENV: &str = "CAREERDB_LOCAL_PATH";

/// Default remote snapshot key and local file name.
const DEFAULT_SNAPSHOT_KEY: &str = "career_data.db";

/// Configuration for lock acquisition.
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// Maximum number of acquisition attempts before giving up.
    pub max_attempts: u32,
    /// How long to sleep between attempts while another holder is active.
    pub retry_delay: Duration,
    /// Age beyond which a marker is presumed abandoned and removed.
    pub staleness_threshold: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            retry_delay: Duration::from_secs(1),
            staleness_threshold: Duration::from_secs(300),
        }
    }
}

impl LockConfig {
    /// Creates a lock configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of acquisition attempts.
    #[must_use]
    pub const fn max_attempts(mut self, value: u32) -> Self {
        self.max_attempts = value;
        self
    }

    /// Sets the delay between acquisition attempts.
    #[must_use]
    pub const fn retry_delay(mut self, value: Duration) -> Self {
        self.retry_delay = value;
        self
    }

    /// Sets the marker staleness threshold.
    #[must_use]
    pub const fn staleness_threshold(mut self, value: Duration) -> Self {
        self.staleness_threshold = value;
        self
    }
}

/// Configuration for the shared database.
///
/// Resolved once at startup; a missing bucket is a fatal setup error,
/// not a runtime retry case.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Bucket/location identifier for the remote store.
    pub bucket: String,
    /// Remote key of the snapshot object.
    pub snapshot_key: String,
    /// Path of the local working copy.
    pub local_path: PathBuf,
    /// Lock acquisition settings.
    pub lock: LockConfig,
}

impl DbConfig {
    /// Creates a configuration for the given bucket with default keys.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            snapshot_key: DEFAULT_SNAPSHOT_KEY.to_string(),
            local_path: PathBuf::from(DEFAULT_SNAPSHOT_KEY),
            lock: LockConfig::default(),
        }
    }

    /// Resolves configuration from the environment.
    ///
    /// `CAREERDB_BUCKET` is required. `CAREERDB_SNAPSHOT_KEY` and
    /// `CAREERDB_LOCAL_PATH` override the defaults when present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingBucket`] if the bucket variable is
    /// absent or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bucket = env::var(BUCKET_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingBucket { var: BUCKET_ENV })?;

        let mut config = Self::new(bucket);
        if let Ok(key) = env::var(SNAPSHOT_KEY_ENV) {
            if !key.is_empty() {
                config = config.snapshot_key(key);
            }
        }
        if let Ok(path) = env::var(LOCAL_PATH_ENV) {
            if !path.is_empty() {
                config = config.local_path(PathBuf::from(path));
            }
        }
        Ok(config)
    }

    /// Returns the remote key of the lock marker, derived from the
    /// snapshot key.
    #[must_use]
    pub fn lock_key(&self) -> String {
        format!("{}.lock", self.snapshot_key)
    }

    /// Sets the remote snapshot key.
    #[must_use]
    pub fn snapshot_key(mut self, key: impl Into<String>) -> Self {
        self.snapshot_key = key.into();
        self
    }

    /// Sets the local working copy path.
    #[must_use]
    pub fn local_path(mut self, path: PathBuf) -> Self {
        self.local_path = path;
        self
    }

    /// Sets the lock acquisition settings.
    #[must_use]
    pub fn lock(mut self, lock: LockConfig) -> Self {
        self.lock = lock;
        self
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = DbConfig::new("career-bucket");
        assert_eq!(config.bucket, "career-bucket");
        assert_eq!(config.snapshot_key, "career_data.db");
        assert_eq!(config.lock_key(), "career_data.db.lock");
        assert_eq!(config.local_path, PathBuf::from("career_data.db"));
        assert_eq!(config.lock.max_attempts, 10);
        assert_eq!(config.lock.retry_delay, Duration::from_secs(1));
        assert_eq!(config.lock.staleness_threshold, Duration::from_secs(300));
    }

    #[test]
    fn builder_pattern() {
        let config = DbConfig::new("bucket")
            .snapshot_key("jobs.db")
            .local_path(PathBuf::from("/tmp/jobs.db"))
            .lock(
                LockConfig::new()
                    .max_attempts(3)
                    .retry_delay(Duration::from_millis(50)),
            );

        assert_eq!(config.snapshot_key, "jobs.db");
        assert_eq!(config.lock_key(), "jobs.db.lock");
        assert_eq!(config.local_path, PathBuf::from("/tmp/jobs.db"));
        assert_eq!(config.lock.max_attempts, 3);
    }

    // Single test for all env behavior: env vars are process-global and
    // tests run in parallel.
    #[test]
    fn from_env_resolution() {
        env::remove_var(BUCKET_ENV);
        env::remove_var(SNAPSHOT_KEY_ENV);
        env::remove_var(LOCAL_PATH_ENV);

        let err = DbConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingBucket { var } if var == BUCKET_ENV));

        env::set_var(BUCKET_ENV, "/mnt/career-bucket");
        let config = DbConfig::from_env().unwrap();
        assert_eq!(config.bucket, "/mnt/career-bucket");
        assert_eq!(config.snapshot_key, "career_data.db");

        env::set_var(SNAPSHOT_KEY_ENV, "jobs.db");
        env::set_var(LOCAL_PATH_ENV, "/tmp/work/jobs.db");
        let config = DbConfig::from_env().unwrap();
        assert_eq!(config.snapshot_key, "jobs.db");
        assert_eq!(config.local_path, PathBuf::from("/tmp/work/jobs.db"));

        env::remove_var(BUCKET_ENV);
        env::remove_var(SNAPSHOT_KEY_ENV);
        env::remove_var(LOCAL_PATH_ENV);
    }
}
