use crate::services::error_handling::ErrorContext;
use anyhow::Result;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Sqlite, SqlitePool};
use std::path::Path;
use tokio::fs;
use tracing::info;

/// Opens (creating if needed) the local dashboard database and applies
/// migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let opened = async {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let db_url = format!("sqlite://{}", db_path.display());

        if !Sqlite::database_exists(&db_url).await? {
            info!(path = %db_path.display(), "Creating local database");
            Sqlite::create_database(&db_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Local database migrations applied");
        Ok::<_, anyhow::Error>(pool)
    }
    .await;

    ErrorContext::new("init_database")
        .with_detail("path", db_path.display())
        .wrap(opened)
}

pub async fn init_test_database() -> Result<SqlitePool> {
    // In-memory databases are per-connection, so keep exactly one.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_test_database() {
        let pool = init_test_database().await.unwrap();

        let result = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name='custom_groups'")
            .fetch_all(&pool)
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn test_init_database_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dashboard.db");

        let pool = init_database(&path).await.unwrap();
        pool.close().await;

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_init_database_failure_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("taken");
        std::fs::write(&blocker, "not a directory").unwrap();
        let path = blocker.join("dashboard.db");

        let error = init_database(&path).await.unwrap_err();

        let message = error.to_string();
        assert!(message.contains("init_database"), "{message}");
        assert!(message.contains("dashboard.db"), "{message}");
    }
}
