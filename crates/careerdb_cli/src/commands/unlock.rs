//! Force-unlock command implementation.

use std::path::Path;
use tracing::warn;

/// Runs the force-unlock command: removes the lock marker regardless of
/// age.
pub fn run(bucket: Option<&Path>, yes: bool) -> Result<(), Box<dyn std::error::Error>> {
    let manager = super::manager(bucket)?;

    match manager.status()?.lock {
        None => {
            println!("No lock marker present; nothing to do");
            return Ok(());
        }
        Some(lock) => {
            if !lock.stale && !yes {
                return Err(format!(
                    "lock is held by {} and only {}s old; it may belong to a live session. \
                     Re-run with --yes to remove it anyway",
                    lock.holder,
                    lock.age.as_secs()
                )
                .into());
            }
            warn!(
                holder = %lock.holder,
                age_secs = lock.age.as_secs(),
                "removing lock marker"
            );
        }
    }

    manager.force_unlock()?;
    println!("✓ Lock marker removed");
    Ok(())
}
