// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token authentication middleware for the gateway's admin routes.
//!
//! The WebSocket upgrade route is authorized separately, by the upgrade-time
//! checks in [`crate::ws::ws_handler`] against the Connection Registry's
//! rules -- this middleware only guards the REST admin surface (force-delete,
//! health, session listing).
//!
//! When no bearer token is configured, all requests are rejected (fail-closed).

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

/// Gateway authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// Expected bearer token. `None` disables admin-route access entirely.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Middleware that validates a bearer token against `Authorization: Bearer <token>`.
///
/// Fail-closed: if no token is configured, every request is rejected.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(ref expected_token) = auth.bearer_token else {
        tracing::error!("gateway has no bearer token configured -- rejecting admin request");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let provided = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == expected_token => Ok(next.run(request).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_config_with_none_token() {
        let config = AuthConfig { bearer_token: None };
        assert!(config.bearer_token.is_none());
    }

    #[test]
    fn auth_config_debug_redacts_token() {
        let config = AuthConfig { bearer_token: Some("secret-token".to_string()) };
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("secret-token"));
        assert!(debug_output.contains("[redacted]"));
    }
}
