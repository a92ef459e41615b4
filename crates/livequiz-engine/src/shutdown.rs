// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C), triggering a
//! [`CancellationToken`] the `livequiz` binary's serve loop monitors. Running
//! Sessions are drained (given time to reach END on their own) before the
//! process exits, rather than aborted mid-phase.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::manager::SessionManager;

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is
/// received. The signal handler task runs in the background until the token
/// is cancelled.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Waits up to `timeout` for every Session the manager still tracks to reach
/// END on its own (self-removing from the map), polling at short intervals.
///
/// Sessions still running when the deadline passes are left running; the
/// process exit after this call does not `force_delete` them -- a Session
/// mid-QUESTION should finish its phase rather than be cut off arbitrarily.
pub async fn drain_sessions(manager: &SessionManager, timeout: Duration) {
    let active_count = manager.len();
    if active_count == 0 {
        info!("no active sessions to drain");
        return;
    }

    info!(count = active_count, "waiting for active sessions to reach end");

    let poll_interval = Duration::from_millis(200);
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        let still_active = manager.len();
        if still_active == 0 {
            info!("all sessions drained successfully");
            return;
        }

        if tokio::time::Instant::now() >= deadline {
            warn!(
                remaining = still_active,
                ids = ?manager.running_ids(),
                "timeout reached, some sessions did not reach end"
            );
            return;
        }

        tokio::time::sleep(poll_interval).await;
    }
}
