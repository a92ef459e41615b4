// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `livequiz migrate` command implementation.
//!
//! Opens the configured database and runs any pending migrations, then exits.
//! Useful for running migrations ahead of a deploy, separately from `serve`.

use livequiz_config::model::AppConfig;
use livequiz_core::EngineError;
use livequiz_storage::Database;
use tracing::info;

/// Runs the `livequiz migrate` command.
pub async fn run_migrate(config: AppConfig) -> Result<(), EngineError> {
    info!(path = %config.storage.database_path, "running migrations");

    let db = Database::open(&config.storage.database_path).await?;
    db.close().await?;

    println!("Migrations applied to '{}'.", config.storage.database_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrate_opens_and_closes_a_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("migrate-test.db");

        let mut config = AppConfig::default();
        config.storage.database_path = db_path.to_str().unwrap().to_string();

        let result = run_migrate(config).await;
        assert!(result.is_ok());
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("migrate-twice.db");

        let mut config = AppConfig::default();
        config.storage.database_path = db_path.to_str().unwrap().to_string();

        run_migrate(config.clone()).await.unwrap();
        let result = run_migrate(config).await;
        assert!(result.is_ok());
    }
}
