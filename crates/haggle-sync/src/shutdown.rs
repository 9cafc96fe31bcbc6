// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SIGINT/SIGTERM handling.
//!
//! The worker only checks the returned token between cycles, so a signal
//! never interrupts a reconcile or a send halfway.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Spawn a task that cancels the returned token on the first SIGINT or SIGTERM.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let stop = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        stop.cancel();
        debug!("stop requested");
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler, only Ctrl+C will stop");
            return wait_for_ctrl_c().await;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("SIGINT received, shutting down");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received, shutting down");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    wait_for_ctrl_c().await
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("SIGINT received, shutting down"),
        Err(e) => {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await
        }
    }
}
