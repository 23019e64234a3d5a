use anyhow::Result;
use colored::Colorize;

use crate::app::{init_config, Config};

use super::Commands;

/// Handle CLI subcommands. Returns true when the process should exit.
pub fn handle_command(command: &Commands, config: &Config) -> Result<bool> {
    match command {
        Commands::Init => {
            match init_config()? {
                Some(path) => println!("Created default configuration at: {}", path.display()),
                None => println!("Configuration already exists, nothing to do."),
            }
            Ok(true)
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(config)?);
            Ok(true)
        }
        Commands::Version => {
            show_version();
            Ok(true)
        }
        Commands::Chat => Ok(false),
    }
}

/// Show version information
pub fn show_version() {
    println!("{} v{}", "paclead-chat".bold(), env!("CARGO_PKG_VERSION"));
    println!("   Terminal front end for the Pac-Lead dashboard assistant");
}
