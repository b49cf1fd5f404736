use anyhow::Result;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::cleanup::Cleanup;
use crate::commands::run::build_cleanup;
use crate::config::CleanupConfig;

pub async fn run_service(config: &CleanupConfig, interval: Duration, dry_run: bool) -> Result<()> {
    let cleanup = build_cleanup(config, dry_run).await?;
    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    let passes = serve(&cleanup, interval, shutdown).await;
    tracing::info!(passes, "File cleanup service stopped");
    Ok(())
}

/// Runs one cleanup pass per `interval` until `shutdown` is cancelled.
///
/// A pass in progress always finishes; only the wait between passes is
/// interrupted. Returns the number of passes run.
pub async fn serve(cleanup: &Cleanup, interval: Duration, shutdown: CancellationToken) -> usize {
    let interval_hours = interval.as_secs_f64() / 3600.0;
    tracing::info!(interval_hours, "File cleanup service started");

    let mut passes = 0;
    while !shutdown.is_cancelled() {
        let report = cleanup.run().await;
        passes += 1;
        tracing::info!(
            pass = passes,
            candidates = report.candidates(),
            failed = report.failed(),
            "Cleanup pass finished"
        );

        tracing::info!(interval_hours, "Waiting for the next cleanup pass");
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    passes
}

async fn cancel_on_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping after the current pass");
    shutdown.cancel();
}
