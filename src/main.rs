use anyhow::Result;
use clap::Parser;

use paclead_chat::{cli::Cli, runtime::Orchestrator, utils::init_logger};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Set up logging if verbose
    if cli.verbose {
        init_logger();
    }

    let orchestrator = Orchestrator::new(cli)?;
    if !orchestrator.run().await? {
        std::process::exit(1);
    }

    Ok(())
}
