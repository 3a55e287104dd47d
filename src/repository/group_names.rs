use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Locally persisted list of custom group names, kept so a name survives
/// even when no record carries it yet.
#[async_trait]
pub trait GroupNameStore: Send + Sync {
    async fn list(&self) -> Result<Vec<String>>;

    /// Adds `name` unless it is already stored. Returns whether it was new.
    async fn add(&self, name: &str) -> Result<bool>;
}

#[derive(Clone)]
pub struct SqliteGroupNameStore {
    pool: SqlitePool,
}

impl SqliteGroupNameStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupNameStore for SqliteGroupNameStore {
    async fn list(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM custom_groups ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("name")).collect())
    }

    async fn add(&self, name: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO custom_groups (name, created_at)
            VALUES (?, ?)
            ON CONFLICT(name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Non-persistent store for tests and runs without a local database.
#[derive(Clone, Default)]
pub struct MemoryGroupNameStore {
    names: Arc<Mutex<BTreeSet<String>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl MemoryGroupNameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        store.names.lock().extend(names.into_iter().map(Into::into));
        store
    }

    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }
}

#[async_trait]
impl GroupNameStore for MemoryGroupNameStore {
    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.names.lock().iter().cloned().collect())
    }

    async fn add(&self, name: &str) -> Result<bool> {
        if *self.fail_writes.lock() {
            anyhow::bail!("group name store is read-only");
        }
        Ok(self.names.lock().insert(name.to_string()))
    }
}
