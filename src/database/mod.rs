// src/database/mod.rs
//! SQLite persistence for users and their analyses.

pub mod analyses;
pub mod users;

pub use analyses::{AnalysisRepository, AnalysisRow, AnalysisSummary, NewAnalysis};
pub use users::{User, UserRepository};

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database file and run migrations
    pub async fn connect(database_path: &Path) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path.display());
        let pool = SqlitePool::connect(&database_url).await.with_context(|| {
            format!("Failed to connect to database: {}", database_path.display())
        })?;

        info!("Database connection established: {}", database_path.display());

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.pool)
    }

    pub fn analyses(&self) -> AnalysisRepository<'_> {
        AnalysisRepository::new(&self.pool)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                linkedin_id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                email TEXT,
                avatar_url TEXT,
                access_token TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create users table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analyses (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                raw_posts TEXT NOT NULL,
                detected_niche TEXT,
                growth_score INTEGER NOT NULL,
                full_analysis_json TEXT NOT NULL,
                growth_plan_json TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create analyses table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_analyses_user_created ON analyses(user_id, created_at);",
        )
        .execute(&self.pool)
        .await?;

        info!("Database migrations completed");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Database;
    use tempfile::TempDir;

    /// Fresh database in a temp dir; keep the dir alive for the test's duration
    pub async fn temp_database() -> (Database, TempDir) {
        let dir = tempfile::tempdir().expect("temp dir");
        let db = Database::connect(&dir.path().join("test.db"))
            .await
            .expect("database");
        (db, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::temp_database;

    #[tokio::test]
    async fn test_connect_migrates_and_is_healthy() {
        let (db, _dir) = temp_database().await;
        db.health_check().await.unwrap();

        let tables: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .fetch_all(db.pool())
                .await
                .unwrap();
        let names: Vec<&str> = tables.iter().map(|(name,)| name.as_str()).collect();

        assert!(names.contains(&"users"));
        assert!(names.contains(&"analyses"));
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let (db, _dir) = temp_database().await;
        db.migrate().await.unwrap();
    }
}
