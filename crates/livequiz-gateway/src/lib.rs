// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport Adapter (C7): the WebSocket/HTTP boundary for the live quiz
//! session engine.
//!
//! Accepts connection upgrades, authorizes them against the Storage
//! Repository (C1) and Session Manager (C6) per spec.md §6.1, then routes
//! inbound frames into [`livequiz_engine::Session`] and forwards outbound
//! frames back over the socket. Carries no game logic of its own -- the
//! engine crate owns every state transition this adapter drives.

pub mod auth;
pub mod handlers;
pub mod server;
pub mod ws;

#[cfg(test)]
mod tests_support;

pub use server::{build_router, start_server, GatewayState, HealthState, ServerConfig};
