pub mod toml_config;

#[cfg(feature = "cli")]
use clap::{Parser, ValueEnum};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "collection-sync")]
#[command(about = "Keep Plex collections in sync with Trakt lists")]
pub struct CliArgs {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "collection-sync.toml")]
    pub config: String,

    /// Only sync the named collection (repeatable)
    #[arg(long = "collection")]
    pub collections: Vec<String>,

    /// Compute the changes without applying them
    #[arg(long)]
    pub dry_run: bool,

    /// Keep going with the next collection after a failure
    #[arg(long)]
    pub continue_on_failure: bool,

    /// Write the run summary as JSON to this path
    #[arg(long)]
    pub summary_json: Option<String>,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}
