//! OS signal handling.
//!
//! SIGINT/SIGTERM trigger graceful shutdown. On Unix, SIGHUP re-reads the
//! config file and pushes it through the reload channel.

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::config::watcher::reload_into;
use crate::config::GatewayConfig;
use crate::lifecycle::Shutdown;

/// Wait for Ctrl+C or SIGTERM, then trigger `shutdown`.
pub async fn shutdown_on_signal(shutdown: Shutdown) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
    shutdown.trigger();
}

/// Reload `path` on every SIGHUP until shutdown.
#[cfg(unix)]
pub async fn reload_on_hangup(
    path: PathBuf,
    tx: mpsc::UnboundedSender<GatewayConfig>,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(sig) => sig,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install SIGHUP handler");
            return;
        }
    };

    loop {
        tokio::select! {
            _ = hangup.recv() => {
                tracing::info!(path = ?path, "SIGHUP received, reloading config");
                reload_into(&path, &tx);
            }
            _ = shutdown.recv() => break,
        }
    }
}

#[cfg(not(unix))]
pub async fn reload_on_hangup(
    _path: PathBuf,
    _tx: mpsc::UnboundedSender<GatewayConfig>,
    _shutdown: tokio::sync::broadcast::Receiver<()>,
) {
}
