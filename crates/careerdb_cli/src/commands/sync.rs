//! Sync command implementation.

use std::path::Path;
use tracing::info;

/// Runs the sync command: a lock-guarded pull into the working
/// directory.
pub fn run(bucket: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let manager = super::manager(bucket)?;
    info!("synchronizing {}", manager.config().snapshot_key);

    let downloaded = manager.sync_db()?;
    if downloaded {
        println!(
            "✓ Snapshot downloaded to {:?}",
            manager.config().local_path
        );
    } else {
        println!(
            "No remote snapshot yet; initialized empty local database at {:?}",
            manager.config().local_path
        );
    }

    Ok(())
}
