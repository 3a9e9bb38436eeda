//! Registration orchestration.
//!
//! A run moves through a short foreground phase and a detached background phase:
//!
//! 1. **Credentials** - acquired once. Without a token the item URLs are handed off to
//!    the recovery store, a login is requested and the run ends as
//!    [`RegistrationOutcome::NeedsAuth`] without any RPC traffic.
//! 2. **Container** - one notebook is created and a viewer is requested for it.
//!    [`Registrar::register`] returns as soon as this succeeds.
//! 3. **Background** ([`pipeline`]) - items are submitted with bounded concurrency,
//!    the notebook is polled until their ids appear, then every configured artifact
//!    kind is generated concurrently. The terminal [`RunReport`] is available through
//!    [`RunHandle::wait`], and progress is published as [`Event`]s.

mod pipeline;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::artifacts::PROJECT_TYPE;
use crate::auth::{CredentialSource, PageCredentialSource};
use crate::config::Config;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::extract::{HeuristicExtractor, IdExtractor};
use crate::recovery::{MemoryRecoveryStore, RecoveryStore, consume_pending};
use crate::rpc::{RpcClient, build_http_client};
use crate::types::{
    ArtifactKind, AuthContext, ContainerId, Event, ItemId, ItemSource, RpcMethod, RunStatus,
};

/// Feature flag marker sent with notebook creation and source registration
const FEATURE_FLAGS: u8 = 1;

/// Result of one artifact generation call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactReport {
    /// Artifact kind
    pub kind: ArtifactKind,
    /// Whether the service accepted the request
    pub success: bool,
    /// Error message on failure
    pub error: Option<String>,
}

/// Terminal summary of a run's background phase
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Notebook the run registered into
    pub container_id: ContainerId,
    /// Item submissions that succeeded
    pub submitted: usize,
    /// Item submissions that failed
    pub failed_submissions: usize,
    /// Source ids discovered by polling
    pub item_ids: Vec<ItemId>,
    /// One entry per attempted artifact kind, in configured order
    pub artifacts: Vec<ArtifactReport>,
    /// Terminal classification
    pub status: RunStatus,
    /// Message of the error that ended the run, when `status` is `Failed`
    pub error: Option<String>,
}

impl RunReport {
    fn new(container_id: ContainerId) -> Self {
        Self {
            container_id,
            submitted: 0,
            failed_submissions: 0,
            item_ids: Vec::new(),
            artifacts: Vec::new(),
            status: RunStatus::Partial,
            error: None,
        }
    }

    /// Kinds whose generation request succeeded
    pub fn generated(&self) -> Vec<ArtifactKind> {
        self.artifacts
            .iter()
            .filter(|a| a.success)
            .map(|a| a.kind)
            .collect()
    }
}

/// Handle to a run whose background phase is in progress
#[derive(Debug)]
pub struct RunHandle {
    container_id: ContainerId,
    viewer_url: String,
    task: JoinHandle<RunReport>,
}

impl RunHandle {
    /// Notebook created for this run
    pub fn container_id(&self) -> &ContainerId {
        &self.container_id
    }

    /// Viewer URL requested for the notebook
    pub fn viewer_url(&self) -> &str {
        &self.viewer_url
    }

    /// Wait for the background phase to settle
    ///
    /// Errors inside the pipeline are already folded into the report as
    /// [`RunStatus::Failed`]; this only fails if the task itself panicked or was aborted.
    pub async fn wait(self) -> Result<RunReport> {
        self.task
            .await
            .map_err(|e| Error::Other(format!("registration task did not complete: {e}")))
    }
}

/// Outcome of the foreground phase of [`Registrar::register`]
#[derive(Debug)]
pub enum RegistrationOutcome {
    /// No usable credentials; items were handed off and a login was requested
    NeedsAuth,
    /// The notebook exists and background processing has started
    Started(RunHandle),
}

/// Orchestrates registration runs (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Registrar {
    pub(crate) config: Arc<Config>,
    pub(crate) rpc: RpcClient,
    pub(crate) credentials: Arc<dyn CredentialSource>,
    pub(crate) recovery: Arc<dyn RecoveryStore>,
    pub(crate) extractor: Arc<dyn IdExtractor>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
}

impl Registrar {
    /// Create a registrar with the default collaborators
    ///
    /// - HTTP client carrying the configured session cookie
    /// - Credentials scraped from `base_url`
    /// - Shape-based id extraction
    /// - SQLite recovery store when `recovery.database_path` is set, in-memory otherwise
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let http = build_http_client(&config.service)?;
        let rpc = RpcClient::new(http.clone(), config.rpc_url()?.to_string());
        let credentials = PageCredentialSource::new(http, config.service.base_url.clone())?;

        let recovery: Arc<dyn RecoveryStore> = match &config.recovery.database_path {
            Some(path) => Arc::new(Database::new(path).await?),
            None => Arc::new(MemoryRecoveryStore::new()),
        };

        tracing::info!(
            base_url = %config.service.base_url,
            concurrency_limit = config.submission.concurrency_limit,
            persistent_recovery = config.recovery.database_path.is_some(),
            "registrar initialized"
        );

        Ok(Self::with_parts(
            config,
            rpc,
            Arc::new(credentials),
            recovery,
            Arc::new(HeuristicExtractor::default()),
        ))
    }

    /// Create a registrar from explicit collaborators
    pub fn with_parts(
        config: Config,
        rpc: RpcClient,
        credentials: Arc<dyn CredentialSource>,
        recovery: Arc<dyn RecoveryStore>,
        extractor: Arc<dyn IdExtractor>,
    ) -> Self {
        // Buffer of 1000 events; slower subscribers receive RecvError::Lagged
        let (event_tx, _rx) = broadcast::channel(1000);

        Self {
            config: Arc::new(config),
            rpc,
            credentials,
            recovery,
            extractor,
            event_tx,
        }
    }

    /// Subscribe to run events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use nlm_ingest::{Config, Registrar};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let registrar = Registrar::new(Config::default()).await?;
    ///
    ///     let mut events = registrar.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             tracing::info!(?event, "registration event");
    ///         }
    ///     });
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Take the items a previous run handed off, if they are still fresh
    ///
    /// See [`consume_pending`] for the exact semantics.
    pub async fn consume_pending(&self) -> Result<Option<Vec<String>>> {
        consume_pending(self.recovery.as_ref(), self.config.recovery.ttl).await
    }

    /// Register `items` into a new notebook
    ///
    /// Returns once the notebook exists; artifact generation continues in the background.
    /// Errors are returned only for failures before the background phase, and in that
    /// case the item URLs have already been handed off for recovery.
    #[tracing::instrument(skip_all, fields(items = items.len()))]
    pub async fn register(&self, items: Vec<ItemSource>) -> Result<RegistrationOutcome> {
        tracing::info!("starting registration");
        let urls: Vec<String> = items.iter().map(|item| item.url.clone()).collect();

        let auth = match self.credentials.acquire().await {
            Ok(auth) if auth.is_valid() => auth,
            Ok(_) => {
                tracing::info!("credential source returned an empty token");
                self.hand_off(&urls).await;
                return Ok(RegistrationOutcome::NeedsAuth);
            }
            Err(e) => {
                tracing::info!(error = %e, code = e.code(), "credentials unavailable");
                self.hand_off(&urls).await;
                return Ok(RegistrationOutcome::NeedsAuth);
            }
        };

        let title = container_title(
            &self.config.container.title_prefix,
            chrono::Local::now().date_naive(),
        );
        let container_id = match self.create_container(&title, &auth).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(error = %e, code = e.code(), "notebook creation failed");
                self.hand_off(&urls).await;
                return Err(e);
            }
        };
        tracing::info!(container_id = %container_id, %title, "notebook created");
        self.emit_event(Event::ContainerCreated {
            container_id: container_id.clone(),
            title,
        });

        let viewer_url = viewer_url(&self.config.service.base_url, &container_id);
        self.emit_event(Event::ViewerRequested {
            container_id: container_id.clone(),
            url: viewer_url.clone(),
        });

        let run = self.clone();
        let background_id = container_id.clone();
        let task =
            tokio::spawn(async move { run.run_pipeline(background_id, items, auth).await });

        Ok(RegistrationOutcome::Started(RunHandle {
            container_id,
            viewer_url,
            task,
        }))
    }

    async fn create_container(&self, title: &str, auth: &AuthContext) -> Result<ContainerId> {
        let params = json!([title, null, null, [PROJECT_TYPE], [FEATURE_FLAGS]]);
        let payload = self
            .rpc
            .call(RpcMethod::CreateContainer, &params, auth)
            .await?
            .ok_or_else(|| Error::extraction("create-container payload"))?;

        self.extractor
            .container_id(&payload)
            .ok_or_else(|| Error::extraction("container id"))
    }

    /// Write the URLs to the recovery store and request an interactive login
    async fn hand_off(&self, urls: &[String]) {
        match self.recovery.put(urls, Utc::now()).await {
            Ok(()) => {
                tracing::info!(items = urls.len(), "items handed off for recovery");
                self.emit_event(Event::HandoffStored { items: urls.len() });
            }
            Err(e) => {
                tracing::error!(error = %e, items = urls.len(), "failed to store recovery hand-off");
            }
        }

        self.emit_event(Event::LoginRequired {
            url: self.config.service.base_url.clone(),
        });
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped (ok() converts Err to None).
    /// This allows the run to continue even if no one is listening to events.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

/// Parameters of a get-container call
pub(crate) fn get_container_params(container: &ContainerId) -> Value {
    json!([container.as_str(), null, [PROJECT_TYPE], null, 0])
}

/// Parameters of an add-item call registering `url`
pub(crate) fn add_item_params(container: &ContainerId, url: &str) -> Value {
    json!([
        [[null, null, null, null, null, null, null, [url], null, null, 1]],
        container.as_str(),
        [PROJECT_TYPE],
        [1, null, null, null, null, null, null, null, null, null, [FEATURE_FLAGS]]
    ])
}

/// Notebook title: `"{prefix} (YYYY/M/D)"`
pub(crate) fn container_title(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix} ({}/{}/{})", date.year(), date.month(), date.day())
}

/// Viewer URL for a notebook under `base_url`
pub(crate) fn viewer_url(base_url: &str, container: &ContainerId) -> String {
    format!("{}/notebook/{}", base_url.trim_end_matches('/'), container)
}
