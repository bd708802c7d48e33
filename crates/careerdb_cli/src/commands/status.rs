//! Status command implementation.

use std::path::Path;

/// Runs the status command: a read-only report of lock, snapshot, and
/// local state.
pub fn run(bucket: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let manager = super::manager(bucket)?;
    let status = manager.status()?;

    println!("CareerDB status");
    println!("  Bucket:   {}", manager.config().bucket);
    println!("  Snapshot: {}", manager.config().snapshot_key);
    println!();

    match status.lock {
        Some(lock) => {
            let staleness = if lock.stale { " (stale)" } else { "" };
            println!(
                "  Lock:     held by {} for {}s{}",
                lock.holder,
                lock.age.as_secs(),
                staleness
            );
        }
        None => println!("  Lock:     not held"),
    }

    match status.remote_len {
        Some(len) => println!("  Remote:   {} bytes", len),
        None => println!("  Remote:   absent (first run)"),
    }

    match status.local_len {
        Some(len) => println!(
            "  Local:    {} bytes at {:?}",
            len,
            manager.config().local_path
        ),
        None => println!("  Local:    absent (run `careerdb sync`)"),
    }

    Ok(())
}
