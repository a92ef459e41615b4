// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP/WebSocket server built on axum.
//!
//! Sets up routes, middleware, and shared state for the live quiz transport
//! adapter (C7).

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use livequiz_core::{EngineError, StorageRepository};
use livequiz_engine::SessionManager;

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;
use crate::ws;

/// Health state for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    pub start_time: std::time::Instant,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Owns every running Session (C6).
    pub manager: Arc<SessionManager>,
    /// The Storage Repository (C1), consulted directly for the upgrade-time
    /// checks in spec.md §6.1 that precede `SessionManager::get_or_create`.
    pub storage: Arc<dyn StorageRepository>,
    /// Bearer-token auth configuration for the admin routes.
    pub auth: AuthConfig,
    /// Health state for the unauthenticated `/health` endpoint.
    pub health: HealthState,
}

/// Gateway server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Bearer token for the admin routes (`None` disables them entirely).
    pub bearer_token: Option<String>,
}

/// Assembles the gateway's axum [`Router`]: health, admin, and WebSocket
/// upgrade routes over shared [`GatewayState`].
///
/// Split out from [`start_server`] so integration tests can drive the router
/// directly (via `tower::ServiceExt::oneshot` or a real bound listener)
/// without going through CLI config parsing.
pub fn build_router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route(
            "/admin/interactives/{id}/force-delete",
            post(handlers::force_delete_interactive),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ))
        .with_state(state.clone());

    let ws_routes = Router::new().route("/ws", get(ws::ws_handler)).with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .merge(ws_routes)
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP/WebSocket server.
///
/// Binds to the configured host:port and serves:
/// - GET /health (unauthenticated)
/// - GET /ws?interactive_id=..&user_id=..&role=.. (upgrade-time authorization)
/// - POST /admin/interactives/:id/force-delete (bearer token)
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), EngineError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| EngineError::Transport(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| EngineError::Transport(format!("gateway server error: {e}")))?;

    Ok(())
}
