//! Database layer for nlm-ingest
//!
//! SQLite persistence for the recovery hand-off, so pending items survive a host
//! restart between the credential failure and the user's login.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`handoff`] - Pending hand-off row and the [`RecoveryStore`](crate::recovery::RecoveryStore) impl

use sqlx::{FromRow, sqlite::SqlitePool};

mod handoff;
mod migrations;

/// Pending hand-off record from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub struct HandoffRow {
    /// JSON array of item URLs
    pub items: String,
    /// Unix timestamp in milliseconds when the hand-off was written
    pub stored_at: i64,
}

/// Database handle for nlm-ingest
pub struct Database {
    pool: SqlitePool,
}
