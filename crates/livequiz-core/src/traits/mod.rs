// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the boundary the session engine depends on.

pub mod storage;

pub use storage::StorageRepository;
