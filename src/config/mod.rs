pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "status-resolver")]
#[command(about = "Resolve whether an entity is open, closed or delayed from several sources")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "status-config.toml")]
    pub config: String,

    /// Ignore the cached result and run a fresh resolution cycle
    #[arg(long)]
    pub no_cache: bool,

    /// Number of reads to issue in a row
    #[arg(long, default_value = "1")]
    pub repeat: usize,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}
