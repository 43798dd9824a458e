//! DroneWatch - drone, camera, guard and robber agents coordinating over
//! a shared performative-tagged message channel.

use clap::Parser;
use std::process::ExitCode;

use dronewatch::{logging, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    // Held until exit so buffered file logs are flushed
    let _guard = match logging::init() {
        Ok((guard, _)) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Parse command line arguments
    let args = Commands::parse();

    // Run the command
    match args.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
