use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

mod checksum;
mod cli;
mod error;
mod iso;
mod pipeline;
mod preflight;
mod template;
mod workspace;

use cli::Cli;
use pipeline::Remaster;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("mkbootiso={},warn", log_level))
        .init();

    info!("mkbootiso v{} starting", env!("CARGO_PKG_VERSION"));

    let remaster = Remaster::new(cli);
    match remaster.run() {
        Ok(output) => {
            info!("✓ Wrote bootable image: {}", output.display());
            Ok(())
        }
        Err(e) => {
            error!("✗ Remastering failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
