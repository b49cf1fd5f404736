use anyhow::Result;
use std::sync::Arc;

use crate::api_client::ApiClient;
use crate::cleanup::{Cleanup, CleanupSettings, RunReport};
use crate::config::{CleanupConfig, DeletionStrategy};
use crate::remover::{ApiRemover, ObjectRemover, StorageRemover};
use crate::s3_client::S3Store;

/// Wires the API client and the configured removal strategy into a workflow.
pub async fn build_cleanup(config: &CleanupConfig, dry_run: bool) -> Result<Cleanup> {
    let api = ApiClient::new(&config.api)?;
    let remover: Arc<dyn ObjectRemover> = match config.strategy {
        DeletionStrategy::Api => Arc::new(ApiRemover::new(api.clone(), config.api.endpoints.delete.clone())),
        DeletionStrategy::Storage => Arc::new(StorageRemover::new(S3Store::connect(&config.storage).await)),
    };

    Ok(Cleanup::new(api, remover, CleanupSettings::from_config(config, dry_run)))
}

pub async fn run_once(config: &CleanupConfig, dry_run: bool, verbose: bool) -> Result<()> {
    let cleanup = build_cleanup(config, dry_run).await?;
    if verbose {
        println!("🧹 Starting manual cleanup of bucket {}", config.storage.bucket);
    }

    let report = cleanup.run().await;
    print_summary(&report, verbose);
    Ok(())
}

fn print_summary(report: &RunReport, verbose: bool) {
    if let Some(error) = &report.list_error {
        println!("⚠️ Could not fetch files to delete: {}", error);
        return;
    }
    if report.candidates() == 0 {
        println!("Nothing to delete");
        return;
    }

    if verbose {
        for item in &report.items {
            println!(
                "  {} -> {} (removal: {:?}, mark: {:?})",
                item.candidate, item.key, item.removal, item.mark
            );
        }
    }
    println!(
        "✅ Cleanup completed: {} file(s), {} removed, {} marked deleted, {} with errors",
        report.candidates(),
        report.removed(),
        report.marked(),
        report.failed()
    );
}
