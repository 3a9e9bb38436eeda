//! Configuration types for nlm-ingest

use crate::error::{Error, Result};
use crate::types::ArtifactKind;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Remote service endpoints and HTTP client settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Landing page scraped for credentials; also the login destination
    /// (default: "https://notebooklm.google.com/")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the batchexecute endpoint, relative to `base_url`
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Raw `Cookie` header forwarded on every request
    ///
    /// The service authenticates with the browser session cookie. A host that runs
    /// outside the browser supplies it here; `None` sends no cookie.
    #[serde(default)]
    pub cookie_header: Option<String>,

    /// Timeout for a single HTTP request (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_millis")]
    pub request_timeout: Duration,

    /// User-Agent header value
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            rpc_path: default_rpc_path(),
            cookie_header: None,
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Item submission pacing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Maximum submissions in flight at once (default: 3)
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// Delay each submission waits after its RPC returns (default: 500 ms)
    ///
    /// Keeps the request rate under the service's implicit rate limit.
    #[serde(default = "default_request_delay", with = "duration_millis")]
    pub request_delay: Duration,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: default_concurrency_limit(),
            request_delay: default_request_delay(),
        }
    }
}

/// Polling for item ids after submission
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PollConfig {
    /// Number of polling rounds before the final poll (default: 5)
    #[serde(default = "default_poll_attempts")]
    pub max_attempts: u32,

    /// Delay between polling rounds (default: 2 seconds)
    #[serde(default = "default_poll_delay", with = "duration_millis")]
    pub delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_poll_attempts(),
            delay: default_poll_delay(),
        }
    }
}

/// Audio overview length
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioLength {
    /// Short overview
    #[default]
    Short,
    /// Medium overview
    Medium,
    /// Long overview
    Long,
}

impl AudioLength {
    /// Wire code used in the audio parameter tree
    pub fn code(&self) -> u8 {
        match self {
            AudioLength::Short => 1,
            AudioLength::Medium => 2,
            AudioLength::Long => 3,
        }
    }
}

/// Artifact generation settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Artifacts generated once item ids are known (default: audio overview and infographic)
    #[serde(default = "default_artifact_kinds")]
    pub kinds: Vec<ArtifactKind>,

    /// Output language shared by every artifact kind (default: "ja")
    #[serde(default = "default_language")]
    pub language: String,

    /// Audio overview length (default: short)
    #[serde(default)]
    pub audio_length: AudioLength,

    /// Audio format code (default: 1)
    #[serde(default = "default_one")]
    pub audio_format: u8,

    /// Infographic orientation code (default: 1)
    #[serde(default = "default_one")]
    pub infographic_orientation: u8,

    /// Infographic detail level (default: 2)
    #[serde(default = "default_detail_level")]
    pub infographic_detail_level: u8,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            kinds: default_artifact_kinds(),
            language: default_language(),
            audio_length: AudioLength::default(),
            audio_format: default_one(),
            infographic_orientation: default_one(),
            infographic_detail_level: default_detail_level(),
        }
    }
}

/// Notebook naming
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Prefix of the generated notebook title; the creation date is appended
    #[serde(default = "default_title_prefix")]
    pub title_prefix: String,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            title_prefix: default_title_prefix(),
        }
    }
}

/// Recovery hand-off settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Entries older than this are discarded unconsumed (default: 10 minutes)
    #[serde(default = "default_recovery_ttl", with = "duration_millis")]
    pub ttl: Duration,

    /// SQLite database backing the hand-off store (None = in-memory store)
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            ttl: default_recovery_ttl(),
            database_path: None,
        }
    }
}

/// Main configuration for [`Registrar`](crate::Registrar)
///
/// Sub-configs are flattened for serialization, so the JSON format is a single
/// flat object. Every field has a default, so `{}` is a valid configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote service endpoints and HTTP settings
    #[serde(flatten)]
    pub service: ServiceConfig,

    /// Item submission pacing
    #[serde(flatten)]
    pub submission: SubmissionConfig,

    /// Item id polling
    #[serde(default)]
    pub poll: PollConfig,

    /// Artifact generation
    #[serde(default)]
    pub artifacts: ArtifactConfig,

    /// Notebook naming
    #[serde(flatten)]
    pub container: ContainerConfig,

    /// Recovery hand-off
    #[serde(default)]
    pub recovery: RecoveryConfig,
}

impl Config {
    /// Check settings that would make a run impossible or hang
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.service.base_url)
            .map_err(|e| Error::config("base_url", format!("invalid URL: {e}")))?;
        if self.submission.concurrency_limit == 0 {
            return Err(Error::config("concurrency_limit", "must be at least 1"));
        }
        if self.poll.max_attempts == 0 {
            return Err(Error::config("poll.max_attempts", "must be at least 1"));
        }
        if self.artifacts.kinds.is_empty() {
            return Err(Error::config(
                "artifacts.kinds",
                "at least one artifact kind is required",
            ));
        }
        Ok(())
    }

    /// Absolute URL of the batchexecute endpoint
    pub fn rpc_url(&self) -> Result<url::Url> {
        let base = url::Url::parse(&self.service.base_url)
            .map_err(|e| Error::config("base_url", format!("invalid URL: {e}")))?;
        base.join(&self.service.rpc_path)
            .map_err(|e| Error::config("rpc_path", format!("invalid path: {e}")))
    }
}

fn default_base_url() -> String {
    "https://notebooklm.google.com/".into()
}

fn default_rpc_path() -> String {
    "/_/LabsTailwindUi/data/batchexecute".into()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!("nlm-ingest/", env!("CARGO_PKG_VERSION")).into()
}

fn default_concurrency_limit() -> usize {
    3
}

fn default_request_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_poll_attempts() -> u32 {
    5
}

fn default_poll_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_artifact_kinds() -> Vec<ArtifactKind> {
    vec![ArtifactKind::AudioOverview, ArtifactKind::Infographic]
}

fn default_language() -> String {
    "ja".into()
}

fn default_one() -> u8 {
    1
}

fn default_detail_level() -> u8 {
    2
}

fn default_title_prefix() -> String {
    "YouTube動画".into()
}

fn default_recovery_ttl() -> Duration {
    Duration::from_secs(10 * 60)
}

// Durations are exchanged as integer milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
