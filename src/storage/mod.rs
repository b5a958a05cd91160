use anyhow::{Context as _, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};
use uuid::Uuid;

use crate::tasks::model::TaskRow;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id           TEXT PRIMARY KEY,
    title        TEXT NOT NULL,
    description  TEXT,
    priority     TEXT NOT NULL DEFAULT 'medium',
    is_completed INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
)";

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

impl Storage {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("taskboard.db");
        let opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true);

        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(pool)
            .await
            .context("Failed to create tasks table")?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks (created_at DESC)")
            .execute(pool)
            .await
            .context("Failed to create tasks index")?;
        Ok(())
    }

    // ─── Tasks ───────────────────────────────────────────────────────────────

    pub async fn insert_task(
        &self,
        title: &str,
        description: Option<&str>,
        priority: &str,
    ) -> sqlx::Result<TaskRow> {
        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();
        sqlx::query(
            "INSERT INTO tasks (id, title, description, priority, is_completed, created_at, updated_at)
             VALUES (?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(&id)
        .bind(title)
        .bind(description)
        .bind(priority)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(&id)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn get_task(&self, id: &str) -> sqlx::Result<Option<TaskRow>> {
        sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// List tasks newest-first. The id is a deterministic tie-break for rows
    /// sharing a timestamp.
    pub async fn list_tasks(&self, priority: Option<&str>) -> sqlx::Result<Vec<TaskRow>> {
        if let Some(priority) = priority {
            sqlx::query_as(
                "SELECT * FROM tasks WHERE priority = ? ORDER BY created_at DESC, id DESC",
            )
            .bind(priority)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as("SELECT * FROM tasks ORDER BY created_at DESC, id DESC")
                .fetch_all(&self.pool)
                .await
        }
    }

    /// Write the full column set for a task. Returns the number of rows
    /// touched (0 when the id does not exist).
    pub async fn update_task(
        &self,
        id: &str,
        title: &str,
        description: Option<&str>,
        priority: &str,
        is_completed: bool,
    ) -> sqlx::Result<u64> {
        let now = now_rfc3339();
        let result = sqlx::query(
            "UPDATE tasks SET title = ?, description = ?, priority = ?, is_completed = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(title)
        .bind(description)
        .bind(priority)
        .bind(is_completed)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Flip `is_completed` in a single statement so concurrent toggles cannot
    /// lose a flip. Returns `false` when the id does not exist.
    pub async fn toggle_task(&self, id: &str) -> sqlx::Result<bool> {
        let now = now_rfc3339();
        let result = sqlx::query(
            "UPDATE tasks SET is_completed = NOT is_completed, updated_at = ? WHERE id = ?",
        )
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_task(&self, id: &str) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
