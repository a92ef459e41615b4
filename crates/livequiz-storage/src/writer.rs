// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-writer documentation and enforcement.
//!
//! All writes in this crate are serialized through `tokio-rusqlite`'s single
//! background thread. [`crate::database::Database`] IS the single writer.
//! Query modules accept `&Database` and call through `conn.call()`.
//!
//! Do NOT create additional Connection instances for writes.
