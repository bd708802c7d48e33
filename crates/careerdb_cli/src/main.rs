//! CareerDB CLI
//!
//! Command-line tools for the CareerDB shared database.
//!
//! # Commands
//!
//! - `sync` - Download the latest snapshot into the working directory
//! - `status` - Show lock, remote snapshot, and local working copy state
//! - `force-unlock` - Remove the lock marker regardless of age
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// CareerDB shared-database command-line tools.
#[derive(Parser)]
#[command(name = "careerdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Bucket directory holding the shared snapshot (defaults to $CAREERDB_BUCKET)
    #[arg(global = true, short, long)]
    bucket: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the latest snapshot into the working directory
    Sync,

    /// Show lock, remote snapshot, and local working copy state
    Status,

    /// Remove the lock marker regardless of age
    ///
    /// Unsafe while another session is genuinely active; intended for
    /// recovering from crashed automation runs.
    ForceUnlock {
        /// Confirm removal without further checks
        #[arg(short, long)]
        yes: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Sync => commands::sync::run(cli.bucket.as_deref())?,
        Commands::Status => commands::status::run(cli.bucket.as_deref())?,
        Commands::ForceUnlock { yes } => commands::unlock::run(cli.bucket.as_deref(), yes)?,
        Commands::Version => {
            println!("CareerDB CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
