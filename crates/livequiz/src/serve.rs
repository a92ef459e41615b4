// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `livequiz serve` command implementation.
//!
//! Opens the SQLite repository, builds the Session Manager, starts the
//! gateway, and waits for SIGTERM/SIGINT to drain running sessions before
//! exiting.

use std::sync::Arc;
use std::time::Duration;

use livequiz_config::model::AppConfig;
use livequiz_core::EngineError;
use livequiz_engine::{shutdown, IdleConfig, SessionManager};
use livequiz_gateway::{start_server, GatewayState, HealthState, ServerConfig};
use livequiz_gateway::auth::AuthConfig;
use livequiz_storage::SqliteRepository;
use tracing::info;

/// How long `serve` waits for running sessions to reach END after a shutdown
/// signal before exiting regardless.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs the `livequiz serve` command.
pub async fn run_serve(config: AppConfig) -> Result<(), EngineError> {
    init_tracing(&config.server.log_level);

    info!("starting livequiz serve");

    let storage = SqliteRepository::open(&config.storage.database_path).await?;
    let storage: Arc<dyn livequiz_core::StorageRepository> = Arc::new(storage);

    let idle_cfg = IdleConfig {
        waiting_idle_seconds: config.engine.waiting_idle_seconds,
        waiting_warning_seconds: config.engine.waiting_warning_seconds,
        paused_idle_seconds: config.engine.paused_idle_seconds,
        paused_warning_seconds: config.engine.paused_warning_seconds,
    };
    let manager = SessionManager::new(storage.clone(), idle_cfg, config.engine.tick_seconds);

    let state = GatewayState {
        manager: manager.clone(),
        storage,
        auth: AuthConfig { bearer_token: config.auth.bearer_token.clone() },
        health: HealthState { start_time: std::time::Instant::now() },
    };

    let server_config = ServerConfig {
        host: config.server.bind_address.clone(),
        port: config.server.port,
        bearer_token: config.auth.bearer_token.clone(),
    };

    let cancel = shutdown::install_signal_handler();

    tokio::select! {
        result = start_server(&server_config, state) => {
            result?;
        }
        _ = cancel.cancelled() => {
            info!("shutdown signal received, draining sessions");
            shutdown::drain_sessions(&manager, DRAIN_TIMEOUT).await;
        }
    }

    info!("livequiz serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("livequiz={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
