//! Pending hand-off persistence.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::error::DatabaseError;
use crate::recovery::{PendingHandoff, RecoveryStore};
use crate::{Error, Result};

use super::{Database, HandoffRow};

impl Database {
    /// Write the pending hand-off, replacing any previous one
    pub async fn store_handoff(&self, items: &[String], timestamp: DateTime<Utc>) -> Result<()> {
        let encoded = serde_json::to_string(items)?;
        let stored_at = timestamp.timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO pending_handoff (slot, items, stored_at)
            VALUES (1, ?, ?)
            ON CONFLICT(slot) DO UPDATE SET items = excluded.items, stored_at = excluded.stored_at
            "#,
        )
        .bind(&encoded)
        .bind(stored_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to store hand-off: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Read the pending hand-off, if any
    pub async fn load_handoff(&self) -> Result<Option<PendingHandoff>> {
        let row: Option<HandoffRow> = sqlx::query_as(
            r#"
            SELECT items, stored_at FROM pending_handoff WHERE slot = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to load hand-off: {}",
                e
            )))
        })?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items: Vec<String> = serde_json::from_str(&row.items)?;
        let timestamp = Utc
            .timestamp_millis_opt(row.stored_at)
            .single()
            .ok_or_else(|| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Invalid hand-off timestamp: {}",
                    row.stored_at
                )))
            })?;

        Ok(Some(PendingHandoff { items, timestamp }))
    }

    /// Remove the pending hand-off
    pub async fn clear_handoff(&self) -> Result<()> {
        sqlx::query("DELETE FROM pending_handoff")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to clear hand-off: {}",
                    e
                )))
            })?;

        Ok(())
    }
}

#[async_trait]
impl RecoveryStore for Database {
    async fn put(&self, items: &[String], timestamp: DateTime<Utc>) -> Result<()> {
        self.store_handoff(items, timestamp).await
    }

    async fn get(&self) -> Result<Option<PendingHandoff>> {
        self.load_handoff().await
    }

    async fn clear(&self) -> Result<()> {
        self.clear_handoff().await
    }
}
