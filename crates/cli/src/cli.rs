//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shuffler Dispatcher - periodic forwarding of buffered observations to the analyzer
#[derive(Parser, Debug)]
#[command(
    name = "shuffler-dispatcher",
    author,
    version,
    about = "Shuffler dispatcher: buffered observations to the analyzer",
    long_about = "Periodically forwards buffered encrypted observations to the analyzer.\n\n\
                  Groups that reach the configured threshold are sent in batches and \n\
                  removed; smaller groups are aged out after the disposal period."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SHUFFLER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SHUFFLER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the dispatcher until interrupted
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "shuffler.toml", env = "SHUFFLER_CONFIG")]
    pub config: PathBuf,

    /// Override analyzer URL from configuration
    #[arg(long, env = "SHUFFLER_ANALYZER_URL")]
    pub analyzer_url: Option<String>,

    /// Override analyzer TLS setting from configuration
    #[arg(long, env = "SHUFFLER_ANALYZER_TLS")]
    pub analyzer_tls: Option<bool>,

    /// JSON seed file with buffered observations to load before starting
    #[arg(long, env = "SHUFFLER_SEED")]
    pub seed: Option<PathBuf>,

    /// Log batches instead of sending them to the analyzer
    #[arg(long)]
    pub log_only: bool,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "SHUFFLER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "shuffler.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "shuffler.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
