//! Authenticated batchexecute calls.

use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::codec;
use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::types::{AuthContext, RpcMethod};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// Build the HTTP client shared by credential acquisition and RPC calls
pub fn build_http_client(config: &ServiceConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    if let Some(cookie) = &config.cookie_header {
        let value = HeaderValue::from_str(cookie)
            .map_err(|e| Error::config("cookie_header", format!("invalid header value: {e}")))?;
        headers.insert(COOKIE, value);
    }

    Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(config.request_timeout)
        .build()
        .map_err(Error::Network)
}

/// Client for the service's batchexecute endpoint
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct RpcClient {
    http: Client,
    endpoint: String,
}

impl RpcClient {
    /// Create a client posting to `endpoint` (the absolute batchexecute URL)
    pub fn new(http: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    /// Issue one call and decode its payload
    ///
    /// Returns `Ok(None)` when the service answered successfully but no payload frame
    /// could be decoded. Non-success statuses fail with [`Error::Transport`].
    #[tracing::instrument(skip_all, fields(method = %method))]
    pub async fn call(
        &self,
        method: RpcMethod,
        params: &Value,
        auth: &AuthContext,
    ) -> Result<Option<Value>> {
        let url = self.call_url(method, auth);
        let body = format!(
            "{}&at={}",
            codec::encode(method, params)?,
            urlencoding::encode(auth.token())
        );

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "RPC call failed");
            return Err(Error::Transport {
                method,
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        let payload = codec::decode(&text);
        if payload.is_none() {
            tracing::debug!(bytes = text.len(), "response carried no payload frame");
        }
        Ok(payload)
    }

    fn call_url(&self, method: RpcMethod, auth: &AuthContext) -> String {
        format!(
            "{}?rpcids={}&source-path=/&f.sid={}&rt=c",
            self.endpoint,
            method.id(),
            urlencoding::encode(auth.session_id())
        )
    }
}
