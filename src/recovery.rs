//! Recovery hand-off for runs that stopped at the credential gate.
//!
//! When no credentials are available the pending item URLs are written to a
//! [`RecoveryStore`] and the user is sent to log in. The host later calls
//! [`consume_pending`] to pick them up; entries older than the configured TTL are
//! discarded instead of replayed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::Result;

/// Item URLs waiting for the user to log in
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingHandoff {
    /// URLs of the items the interrupted run was asked to register
    pub items: Vec<String>,
    /// When the hand-off was written
    pub timestamp: DateTime<Utc>,
}

impl PendingHandoff {
    /// Whether the entry is older than `ttl` at `now`
    pub fn is_stale(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.timestamp);
        // a clock that moved backwards yields a negative age, which is never stale
        age.to_std().is_ok_and(|age| age > ttl)
    }
}

/// Key-value persistence for the single pending hand-off
///
/// A store holds at most one entry; `put` replaces whatever was there.
#[async_trait]
pub trait RecoveryStore: Send + Sync {
    /// Write `items` stamped with `timestamp`, replacing any existing entry
    async fn put(&self, items: &[String], timestamp: DateTime<Utc>) -> Result<()>;

    /// Read the current entry without removing it
    async fn get(&self) -> Result<Option<PendingHandoff>>;

    /// Remove the current entry
    async fn clear(&self) -> Result<()>;
}

/// Process-local store, used when no database is configured
#[derive(Debug, Default)]
pub struct MemoryRecoveryStore {
    entry: Mutex<Option<PendingHandoff>>,
}

impl MemoryRecoveryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecoveryStore for MemoryRecoveryStore {
    async fn put(&self, items: &[String], timestamp: DateTime<Utc>) -> Result<()> {
        *self.entry.lock().await = Some(PendingHandoff {
            items: items.to_vec(),
            timestamp,
        });
        Ok(())
    }

    async fn get(&self) -> Result<Option<PendingHandoff>> {
        Ok(self.entry.lock().await.clone())
    }

    async fn clear(&self) -> Result<()> {
        self.entry.lock().await.take();
        Ok(())
    }
}

/// Take the pending hand-off if one exists and is still fresh
///
/// - No entry, or an entry with no items: returns `None` and leaves the store alone.
/// - Entry older than `ttl`: cleared and `None` is returned.
/// - Otherwise: cleared and its items are returned.
pub async fn consume_pending(store: &dyn RecoveryStore, ttl: Duration) -> Result<Option<Vec<String>>> {
    let Some(entry) = store.get().await? else {
        return Ok(None);
    };
    if entry.items.is_empty() {
        return Ok(None);
    }

    store.clear().await?;

    if entry.is_stale(ttl, Utc::now()) {
        tracing::info!(
            items = entry.items.len(),
            stored_at = %entry.timestamp,
            "discarding stale recovery hand-off"
        );
        return Ok(None);
    }

    tracing::info!(items = entry.items.len(), "resuming recovery hand-off");
    Ok(Some(entry.items))
}
