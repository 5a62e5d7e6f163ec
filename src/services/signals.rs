//! Process signal handling and coordinated shutdown.

use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

use crate::services::manager::ServiceManager;

/// Block until SIGINT/SIGTERM, then drain services within `timeout` seconds.
pub async fn handle_shutdown_signals(manager: ServiceManager, timeout_secs: u64) -> ExitCode {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = ?e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!(error = ?e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }

    manager.shutdown(Duration::from_secs(timeout_secs)).await;
    info!("Shutdown complete");
    ExitCode::SUCCESS
}
