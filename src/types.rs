//! Core types for nlm-ingest

use serde::{Deserialize, Serialize};

/// Remote procedures used by a registration run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcMethod {
    /// Create an empty notebook
    CreateContainer,
    /// Fetch notebook details, including its registered sources
    GetContainer,
    /// Register one source into a notebook
    AddItem,
    /// Start generation of a derivative artifact
    CreateArtifact,
}

impl RpcMethod {
    /// Wire identifier sent in the `rpcids` query parameter and the request envelope
    pub fn id(&self) -> &'static str {
        match self {
            RpcMethod::CreateContainer => "CCqFvf",
            RpcMethod::GetContainer => "rLM1Ne",
            RpcMethod::AddItem => "izAoDd",
            RpcMethod::CreateArtifact => "R7cb6c",
        }
    }
}

impl std::fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Anti-forgery token and session id scraped from the service landing page
///
/// Created once per registration run and never persisted. The token is redacted
/// from `Debug` output so it cannot leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthContext {
    token: String,
    session_id: Option<String>,
}

impl AuthContext {
    /// Create a new AuthContext
    pub fn new(token: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            token: token.into(),
            session_id,
        }
    }

    /// A context is usable only when the token is non-empty
    pub fn is_valid(&self) -> bool {
        !self.token.is_empty()
    }

    /// The anti-forgery token (sent as the `at` body field)
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The session id, or an empty string when the page did not expose one
    pub fn session_id(&self) -> &str {
        self.session_id.as_deref().unwrap_or_default()
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("token", &if self.is_valid() { "<redacted>" } else { "<empty>" })
            .field("session_id", &self.session_id)
            .finish()
    }
}

/// Handle of a notebook created on the remote service
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(pub String);

impl ContainerId {
    /// Create a new ContainerId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ContainerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ContainerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Handle the remote service assigns to a registered source
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    /// Create a new ItemId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A content source discovered by the host application
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSource {
    /// Producer-side identifier (e.g., a video id)
    pub id: String,
    /// Display title
    pub title: String,
    /// URL submitted to the service
    pub url: String,
}

impl ItemSource {
    /// Create an ItemSource
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Derivative artifact the service can generate from a notebook's sources
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Spoken overview of the sources
    AudioOverview,
    /// Visual one-page summary
    Infographic,
}

impl ArtifactKind {
    /// Artifact type code expected by the create-artifact procedure
    pub fn type_code(&self) -> u8 {
        match self {
            ArtifactKind::AudioOverview => 1,
            ArtifactKind::Infographic => 7,
        }
    }

    /// Human-readable label used in notifications
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::AudioOverview => "audio overview",
            ArtifactKind::Infographic => "infographic",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity of a user-facing notification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Progress information
    Info,
    /// Terminal success
    Success,
    /// Degraded outcome
    Warning,
    /// Failure
    Error,
}

/// Terminal classification of a registration run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Every requested artifact was produced
    Success,
    /// The notebook exists but some artifacts failed or no sources were discovered
    Partial,
    /// An error escaped the background phase; the notebook still exists
    Failed,
}

/// Event emitted during a registration run
///
/// Events are delivered over a broadcast channel. Sending never fails the run:
/// if nobody is subscribed, or a subscriber lags behind, the event is dropped.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Notebook created on the remote service
    ContainerCreated {
        /// Notebook id
        container_id: ContainerId,
        /// Title the notebook was created with
        title: String,
    },

    /// The host should open a viewer for the new notebook
    ViewerRequested {
        /// Notebook id
        container_id: ContainerId,
        /// Viewer URL
        url: String,
    },

    /// The host should send the user to an interactive login
    LoginRequired {
        /// Login URL
        url: String,
    },

    /// Pending items were written to the recovery store
    HandoffStored {
        /// Number of item URLs handed off
        items: usize,
    },

    /// All item submissions settled
    ItemsSubmitted {
        /// Notebook id
        container_id: ContainerId,
        /// Submissions that succeeded
        succeeded: usize,
        /// Submissions that failed
        failed: usize,
    },

    /// One polling round for item ids completed
    PollAttempt {
        /// Notebook id
        container_id: ContainerId,
        /// 1-based attempt number
        attempt: u32,
        /// Item ids discovered in this round
        found: usize,
        /// Item ids the run is waiting for
        expected: usize,
    },

    /// One artifact generation call settled
    ArtifactFinished {
        /// Notebook id
        container_id: ContainerId,
        /// Artifact kind
        kind: ArtifactKind,
        /// Whether the call succeeded
        success: bool,
        /// Error message on failure
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// User-facing notification scoped to a notebook
    Notification {
        /// Notebook id
        container_id: ContainerId,
        /// Message text
        message: String,
        /// Severity
        severity: Severity,
    },

    /// Background phase finished (successfully or degraded)
    RunFinished {
        /// Notebook id
        container_id: ContainerId,
        /// Terminal classification
        status: RunStatus,
    },

    /// An error escaped the background phase
    RunFailed {
        /// Notebook id
        container_id: ContainerId,
        /// Machine-readable error code (see [`Error::code`](crate::Error::code))
        code: String,
        /// Error message
        error: String,
    },
}
