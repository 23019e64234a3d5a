use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "paclead-chat")]
#[command(version)]
#[command(about = "Terminal front end for the Pac-Lead dashboard assistant", long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides config and PACLEAD_BACKEND__BASE_URL)
    #[arg(short, long, env = "PACLEAD_BACKEND_URL")]
    pub backend: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Non-interactive prompt to send
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Image to attach to the prompt
    #[arg(short, long)]
    pub image: Option<PathBuf>,

    /// Output format for non-interactive mode
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file
    Init,
    /// Print the effective configuration
    Config,
    /// Start a chat session (default)
    Chat,
    /// Show version information
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Text,
    /// JSON structured output
    Json,
}
