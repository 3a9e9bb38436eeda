//! Credential acquisition from the service landing page.
//!
//! The landing page embeds the anti-forgery token (`SNlM0e`) and the session id
//! (`FdrFJe`) in an inline configuration object. A page without a token means the
//! session cookie is missing or expired and the user has to log in interactively.

use async_trait::async_trait;
use regex::Regex;

use crate::error::{Error, Result};
use crate::types::AuthContext;

/// Source of per-run credentials
///
/// The registrar calls [`acquire`](CredentialSource::acquire) exactly once per run and
/// never retries: a missing token is not transient within one run.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Obtain a credential context for one registration run
    async fn acquire(&self) -> Result<AuthContext>;
}

/// Patterns locating the embedded credential values
#[derive(Debug, Clone)]
pub struct CredentialPatterns {
    token: Regex,
    session: Regex,
}

impl CredentialPatterns {
    /// Compile the token and session patterns
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::Other(format!("invalid credential pattern: {e}")))
        };
        Ok(Self {
            token: compile(r#""SNlM0e":"([^"]+)""#)?,
            session: compile(r#""FdrFJe":"([^"]+)""#)?,
        })
    }

    /// Extract `(token, session_id)` from a page body
    pub fn extract(&self, html: &str) -> (Option<String>, Option<String>) {
        let capture = |re: &Regex| {
            re.captures(html)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        };
        (capture(&self.token), capture(&self.session))
    }

    /// Build a credential context from a page body, failing when no token is present
    pub fn context(&self, html: &str) -> Result<AuthContext> {
        match self.extract(html) {
            (Some(token), session_id) => Ok(AuthContext::new(token, session_id)),
            (None, _) => Err(Error::AuthUnavailable {
                reason: "anti-forgery token not found in landing page".into(),
            }),
        }
    }
}

/// Extract a credential context from a landing page body
pub fn extract_credentials(html: &str) -> Result<AuthContext> {
    CredentialPatterns::new()?.context(html)
}

/// Credential source that scrapes the service landing page over HTTP
pub struct PageCredentialSource {
    client: reqwest::Client,
    page_url: String,
    patterns: CredentialPatterns,
}

impl PageCredentialSource {
    /// Create a source fetching `page_url` with `client`
    ///
    /// The client is expected to carry the session cookie (see
    /// [`ServiceConfig::cookie_header`](crate::config::ServiceConfig::cookie_header)).
    pub fn new(client: reqwest::Client, page_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client,
            page_url: page_url.into(),
            patterns: CredentialPatterns::new()?,
        })
    }
}

#[async_trait]
impl CredentialSource for PageCredentialSource {
    #[tracing::instrument(skip_all, fields(url = %self.page_url))]
    async fn acquire(&self) -> Result<AuthContext> {
        let response = self.client.get(&self.page_url).send().await?;
        if !response.status().is_success() {
            return Err(Error::AuthUnavailable {
                reason: format!("landing page returned status {}", response.status()),
            });
        }

        let html = response.text().await?;
        let auth = self.patterns.context(&html)?;
        tracing::debug!(has_session = !auth.session_id().is_empty(), "credentials acquired");
        Ok(auth)
    }
}
