//! # nlm-ingest
//!
//! Backend library that registers batches of video URLs as sources of a new
//! NotebookLM notebook and asks the service to generate derivative artifacts
//! (an audio overview and an infographic) from them.
//!
//! ## Design Philosophy
//!
//! nlm-ingest is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events, no polling required
//! - **Sensible defaults** - Works out of the box with zero configuration
//! - **Replaceable seams** - Credentials, id extraction and the recovery store are traits
//!
//! ## Quick Start
//!
//! ```no_run
//! use nlm_ingest::{Config, ItemSource, Registrar, RegistrationOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.service.cookie_header = Some("SID=...; HSID=...".to_string());
//!
//!     let registrar = Registrar::new(config).await?;
//!
//!     // Subscribe to events
//!     let mut events = registrar.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let items = vec![ItemSource::new(
//!         "dQw4w9WgXcQ",
//!         "Some video",
//!         "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
//!     )];
//!
//!     match registrar.register(items).await? {
//!         RegistrationOutcome::Started(run) => {
//!             println!("Open {}", run.viewer_url());
//!             let report = run.wait().await?;
//!             println!("Finished: {:?}", report.status);
//!         }
//!         RegistrationOutcome::NeedsAuth => println!("Log in and try again"),
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Artifact parameter trees and generation calls
pub mod artifacts;
/// Credential acquisition
pub mod auth;
/// batchexecute request/response framing
pub mod codec;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Id extraction heuristics
pub mod extract;
/// Fixed-attempt polling
pub mod poll;
/// Recovery hand-off store
pub mod recovery;
/// Registration orchestration
pub mod registrar;
/// Authenticated RPC client
pub mod rpc;
/// Bounded-concurrency task execution
pub mod scheduler;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use auth::{CredentialSource, PageCredentialSource};
pub use config::Config;
pub use db::Database;
pub use error::{DatabaseError, Error, Result};
pub use extract::{HeuristicExtractor, IdExtractor};
pub use recovery::{MemoryRecoveryStore, PendingHandoff, RecoveryStore, consume_pending};
pub use registrar::{ArtifactReport, RegistrationOutcome, Registrar, RunHandle, RunReport};
pub use rpc::RpcClient;
pub use types::{
    ArtifactKind, AuthContext, ContainerId, Event, ItemId, ItemSource, RpcMethod, RunStatus,
    Severity,
};
