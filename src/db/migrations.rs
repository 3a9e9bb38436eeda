//! Database lifecycle and schema migrations.

use crate::error::DatabaseError;
use crate::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool};
use sqlx::{Connection, SqliteConnection};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use super::Database;

/// Schema steps in application order, keyed by the version they bring the schema to
const MIGRATIONS: &[(i64, &str)] = &[(
    1,
    // Single-row table: the CHECK pins every write to slot 1
    r#"
    CREATE TABLE pending_handoff (
        slot INTEGER PRIMARY KEY CHECK (slot = 1),
        items TEXT NOT NULL,
        stored_at INTEGER NOT NULL
    )
    "#,
)];

fn connection_failed<E: Display>(context: &'static str) -> impl FnOnce(E) -> Error {
    move |e| Error::Database(DatabaseError::ConnectionFailed(format!("{context}: {e}")))
}

fn migration_failed<E: Display>(context: String) -> impl FnOnce(E) -> Error {
    move |e| Error::Database(DatabaseError::MigrationFailed(format!("{context}: {e}")))
}

impl Database {
    /// Open (or create) the recovery database at `path`
    ///
    /// Missing parent directories are created and pending migrations applied.
    pub async fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(connection_failed("failed to create database directory"))?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(connection_failed("invalid database path"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(connection_failed("failed to open database"))?;

        let db = Self { pool };
        db.run_migrations().await?;

        tracing::debug!(path = %path.display(), "recovery database ready");
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(connection_failed("failed to acquire connection"))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )",
        )
        .execute(&mut *conn)
        .await
        .map_err(migration_failed("failed to create schema_version".into()))?;

        let current = sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(version) FROM schema_version")
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| Error::Database(DatabaseError::QueryFailed(e.to_string())))?
            .flatten()
            .unwrap_or(0);

        for &(version, sql) in MIGRATIONS.iter().filter(|(version, _)| *version > current) {
            Self::apply(&mut *conn, version, sql).await?;
        }

        Ok(())
    }

    /// Apply one schema step and record it, atomically
    async fn apply(conn: &mut SqliteConnection, version: i64, sql: &str) -> Result<()> {
        tracing::info!(version, "applying database migration");

        // Dropping the transaction without commit rolls it back
        let mut tx = conn
            .begin()
            .await
            .map_err(migration_failed(format!("v{version}: failed to begin transaction")))?;

        sqlx::query(sql)
            .execute(&mut *tx)
            .await
            .map_err(migration_failed(format!("v{version}")))?;

        sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES (?, ?)")
            .bind(version)
            .bind(chrono::Utc::now().timestamp())
            .execute(&mut *tx)
            .await
            .map_err(migration_failed(format!("v{version}: failed to record")))?;

        tx.commit()
            .await
            .map_err(migration_failed(format!("v{version}: failed to commit")))?;

        Ok(())
    }

    /// Close the database connection
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
