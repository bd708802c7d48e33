//! CLI command implementations.

pub mod status;
pub mod sync;
pub mod unlock;

use careerdb_store::FsStore;
use careerdb_sync::{DbConfig, SessionManager};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Builds a session manager from the bucket flag or the environment.
pub fn manager(bucket: Option<&Path>) -> Result<SessionManager<FsStore>, Box<dyn std::error::Error>> {
    let config = match bucket {
        Some(path) => DbConfig::new(path.display().to_string()),
        None => DbConfig::from_env()?,
    };
    let store = Arc::new(FsStore::open(&PathBuf::from(&config.bucket))?);
    Ok(SessionManager::new(store, config))
}
