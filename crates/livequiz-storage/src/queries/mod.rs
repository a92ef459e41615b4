// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod answers;
pub mod interactives;
pub mod participants;
pub mod questions;
pub mod users;
