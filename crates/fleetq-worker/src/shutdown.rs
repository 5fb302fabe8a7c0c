//! Termination signal handling.

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::info;

use crate::error::WorkerResult;

/// Install a handler for SIGTERM and SIGINT.
///
/// Returns a receiver that flips to `true` on the first signal. Workers
/// check it between jobs.
pub fn install_shutdown_handler() -> WorkerResult<watch::Receiver<bool>> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, draining workers");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, draining workers");
            }
        }

        let _ = tx.send(true);
    });

    Ok(rx)
}
