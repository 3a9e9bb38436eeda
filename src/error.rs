//! Error types for nlm-ingest
//!
//! This module provides the error taxonomy for a registration run:
//! - Credential failures that require an interactive login
//! - Transport failures on the RPC endpoint (non-success status, network errors)
//! - Extraction failures when an expected handle is missing from a decoded payload
//! - Ambient failures (configuration, persistence, serialization)
//!
//! Two conditions are deliberately not errors. A response without a usable payload
//! line is decoded to `None`, and a run where only some items or artifacts succeeded
//! is reported as [`RunStatus::Partial`](crate::types::RunStatus::Partial).

use crate::types::RpcMethod;
use thiserror::Error;

/// Result type alias for nlm-ingest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for nlm-ingest
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "concurrency_limit")
        key: Option<String>,
    },

    /// The anti-forgery token could not be obtained; the caller needs an interactive login
    #[error("authentication unavailable: {reason}")]
    AuthUnavailable {
        /// Why the credentials could not be obtained
        reason: String,
    },

    /// The service answered an RPC call with a non-success HTTP status
    #[error("RPC {method} failed with HTTP status {status}")]
    Transport {
        /// The RPC method that failed
        method: RpcMethod,
        /// The HTTP status code returned by the service
        status: u16,
    },

    /// An expected id or handle was not present in a successful response
    #[error("failed to extract {what} from response")]
    Extraction {
        /// What was being extracted (e.g., "container id")
        what: String,
    },

    /// Network error (connection refused, timeout, TLS, ...)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

impl Error {
    /// Machine-readable error code, stable across releases
    ///
    /// Used in [`Event::RunFailed`](crate::types::Event::RunFailed) and structured logs so
    /// consumers can branch on the failure class without parsing messages.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::AuthUnavailable { .. } => "auth_unavailable",
            Error::Transport { .. } => "transport_error",
            Error::Extraction { .. } => "extraction_failed",
            Error::Network(_) => "network_error",
            Error::Database(e) => match e {
                DatabaseError::ConnectionFailed(_) => "database_connection_failed",
                DatabaseError::MigrationFailed(_) => "database_migration_failed",
                DatabaseError::QueryFailed(_) => "database_query_failed",
            },
            Error::Sqlx(_) => "database_error",
            Error::Serialization(_) => "serialization_error",
            Error::Io(_) => "io_error",
            Error::Other(_) => "internal_error",
        }
    }

    /// Whether this error means the user must log in interactively before retrying
    pub fn needs_interactive_auth(&self) -> bool {
        matches!(self, Error::AuthUnavailable { .. })
    }

    /// Create an extraction error for the named handle
    pub fn extraction(what: impl Into<String>) -> Self {
        Error::Extraction { what: what.into() }
    }

    /// Create a configuration error tied to a config key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}
