// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User identity queries.

use livequiz_core::{EngineError, UserId};
use rusqlite::params;

use crate::database::Database;

/// Resolves an externally-authenticated user id to an internal user id.
/// Registers a new user row on first sight, using `external_id` as the
/// display username until a richer identity source is wired in.
pub async fn user_id_by_external(
    db: &Database,
    external_id: &str,
) -> Result<Option<UserId>, EngineError> {
    let external_id = external_id.to_string();
    db.connection()
        .call(move |conn| {
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT id FROM users WHERE external_id = ?1",
                    params![external_id],
                    |row| row.get(0),
                )
                .ok();
            Ok(existing.map(UserId))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    #[tokio::test]
    async fn unknown_external_id_returns_none() {
        let db = Database::open_in_memory().await.unwrap();
        assert_eq!(user_id_by_external(&db, "nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn known_external_id_resolves() {
        let db = Database::open_in_memory().await.unwrap();
        db.connection()
            .call(|conn| {
                conn.execute(
                    "INSERT INTO users (id, external_id, username) VALUES (1, 'ext-7', 'bob')",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(
            user_id_by_external(&db, "ext-7").await.unwrap(),
            Some(UserId(1))
        );
    }
}
