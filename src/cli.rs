use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DeletionStrategy;
use crate::logging::LogFormat;

#[derive(Parser)]
#[command(name = "s3-file-cleanup")]
#[command(about = "Delete expired files reported by the management API from object storage")]
#[command(version = "1.0")]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Console log format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Directory for rotated JSON log files (overrides env CLEANUP_LOG_DIR)
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Management API base URL (overrides env CLEANUP_API_BASE_URL)
    #[arg(long, global = true)]
    pub api_base_url: Option<String>,

    /// Management API bearer token (overrides env CLEANUP_API_TOKEN)
    #[arg(long, global = true)]
    pub api_token: Option<String>,

    /// Storage bucket name (overrides env STORAGE_BUCKET)
    #[arg(long, global = true)]
    pub bucket: Option<String>,

    /// Base path files were stored under (overrides env CLEANUP_BASE_PATH)
    #[arg(long, global = true)]
    pub base_path: Option<String>,

    /// Root path stripped from the base path (overrides env CLEANUP_ROOT_PATH)
    #[arg(long, global = true)]
    pub root_path: Option<String>,

    /// How objects are removed (overrides env CLEANUP_DELETION_STRATEGY)
    #[arg(long, global = true, value_enum)]
    pub strategy: Option<DeletionStrategy>,

    /// Storage region (overrides env STORAGE_REGION)
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Storage access key (overrides env STORAGE_ACCESS_KEY)
    #[arg(long, global = true)]
    pub access_key: Option<String>,

    /// Storage secret key (overrides env STORAGE_SECRET_KEY)
    #[arg(long, global = true)]
    pub secret_key: Option<String>,

    /// Storage endpoint URL (overrides env STORAGE_URL)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single cleanup pass and exit
    Run {
        /// Derive keys and log them without deleting anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Keep running, one cleanup pass per interval, until stopped
    Service {
        /// Hours between passes (overrides env CLEANUP_INTERVAL_HOURS)
        #[arg(long)]
        interval_hours: Option<u64>,
        /// Derive keys and log them on every pass without deleting anything
        #[arg(long)]
        dry_run: bool,
    },

    /// List objects in the storage bucket
    List {
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Delete one object directly from the storage bucket
    Delete { key: String },

    /// Print the storage key a candidate file name maps to
    Key { candidate: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::parse_from(["s3-file-cleanup", "service", "--interval-hours", "6", "-v"]);

        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Service {
                interval_hours: Some(6),
                dry_run: false
            }
        ));
    }

    #[test]
    fn parses_json_log_format() {
        let cli = Cli::parse_from(["s3-file-cleanup", "--log-format", "json", "run", "--dry-run"]);

        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Commands::Run { dry_run: true }));
    }
}
