mod api_client;
mod cleanup;
mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod remover;
mod s3_client;
mod storage_key;

use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;

use crate::cli::{Cli, Commands};
use crate::config::{cleanup_interval, log_dir, CleanupConfig, PathRules, StorageConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let _log_guard = logging::init(cli.log_format, cli.verbose, log_dir(&cli).as_deref())?;

    match &cli.command {
        Commands::Run { dry_run } => {
            let config = CleanupConfig::load_from_cli(&cli)?;
            commands::run::run_once(&config, *dry_run, cli.verbose).await?;
        }
        Commands::Service {
            interval_hours,
            dry_run,
        } => {
            let config = CleanupConfig::load_from_cli(&cli)?;
            let interval = cleanup_interval(*interval_hours)?;
            commands::service::run_service(&config, interval, *dry_run).await?;
        }
        Commands::List { prefix, limit } => {
            let config = StorageConfig::load_from_cli(&cli)?;
            commands::list::list_objects(prefix.as_deref(), *limit, &config, cli.verbose).await?;
        }
        Commands::Delete { key } => {
            let config = StorageConfig::load_from_cli(&cli)?;
            commands::delete::delete_object(key, &config, cli.verbose).await?;
        }
        Commands::Key { candidate } => {
            let paths = PathRules::load_from_cli(&cli)?;
            commands::key::print_key(candidate, &paths, cli.verbose);
        }
    }

    Ok(())
}
