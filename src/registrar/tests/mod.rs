//! Shared helpers for registrar tests.

use super::*;
use crate::recovery::MemoryRecoveryStore;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;
use wiremock::MockServer;


pub(super) const NOTEBOOK: &str = "0c1d2e3f-4a5b-6c7d-8e9f-0a1b2c3d4e5f";

/// Credential source returning a fixed context, or `AuthUnavailable` when `None`
pub(super) struct StaticCredentials(pub Option<AuthContext>);

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn acquire(&self) -> Result<AuthContext> {
        self.0.clone().ok_or_else(|| Error::AuthUnavailable {
            reason: "no session".into(),
        })
    }
}

pub(super) fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.service.base_url = format!("{}/", server.uri());
    config.submission.request_delay = Duration::ZERO;
    config.poll.max_attempts = 3;
    config.poll.delay = Duration::from_millis(10);
    config
}

pub(super) fn registrar_for(
    server: &MockServer,
    auth: Option<AuthContext>,
) -> (Registrar, Arc<MemoryRecoveryStore>) {
    registrar_with(server, test_config(server), auth)
}

pub(super) fn registrar_with(
    server: &MockServer,
    config: Config,
    auth: Option<AuthContext>,
) -> (Registrar, Arc<MemoryRecoveryStore>) {
    let store = Arc::new(MemoryRecoveryStore::new());
    let registrar = Registrar::with_parts(
        config,
        RpcClient::new(reqwest::Client::new(), format!("{}/rpc", server.uri())),
        Arc::new(StaticCredentials(auth)),
        store.clone(),
        Arc::new(HeuristicExtractor::default()),
    );
    (registrar, store)
}

pub(super) fn valid_auth() -> Option<AuthContext> {
    Some(AuthContext::new("tok:1", Some("-99".into())))
}

pub(super) fn items(n: usize) -> Vec<ItemSource> {
    (0..n)
        .map(|i| {
            ItemSource::new(
                format!("vid{i:08}"),
                format!("Video {i}"),
                format!("https://www.youtube.com/watch?v=vid{i:08}"),
            )
        })
        .collect()
}

/// A batchexecute response body carrying `payload` in one data frame
pub(super) fn rpc_body(method: RpcMethod, payload: &Value) -> String {
    format!(
        ")]}}'\n\n{}\n",
        json!([["wrb.fr", method.id(), payload.to_string(), null, null, null, "generic"]])
    )
}

pub(super) fn source_id(i: usize) -> String {
    format!("source-{i:04}-aaaaaaaaaaaaaaaaaaaa")
}

/// A get-container payload listing `n` sources
pub(super) fn notebook_payload(n: usize) -> Value {
    let sources: Vec<Value> = (0..n)
        .map(|i| json!([[source_id(i)], format!("Video {i}"), [null, 2]]))
        .collect();
    json!([["YouTube notebook", sources, NOTEBOOK]])
}

pub(super) fn drain(rx: &mut Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[test]
fn container_title_uses_unpadded_date() {
    let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
    assert_eq!(container_title("YouTube動画", date), "YouTube動画 (2025/3/7)");

    let date = NaiveDate::from_ymd_opt(2025, 12, 24).unwrap();
    assert_eq!(container_title("Clips", date), "Clips (2025/12/24)");
}

#[test]
fn viewer_url_joins_base() {
    let id = ContainerId::new("nb-1");
    assert_eq!(
        viewer_url("https://notebooklm.google.com/", &id),
        "https://notebooklm.google.com/notebook/nb-1"
    );
    assert_eq!(
        viewer_url("http://127.0.0.1:8080", &id),
        "http://127.0.0.1:8080/notebook/nb-1"
    );
}

#[test]
fn add_item_params_shape() {
    let params = add_item_params(&ContainerId::new("nb-1"), "https://youtu.be/x");
    assert_eq!(
        params,
        json!([
            [[null, null, null, null, null, null, null, ["https://youtu.be/x"], null, null, 1]],
            "nb-1",
            [2],
            [1, null, null, null, null, null, null, null, null, null, [1]]
        ])
    );
}

#[test]
fn get_container_params_shape() {
    assert_eq!(
        get_container_params(&ContainerId::new("nb-1")),
        json!(["nb-1", null, [2], null, 0])
    );
}

#[test]
fn report_lists_generated_kinds_in_order() {
    let mut report = RunReport::new(ContainerId::new("nb-1"));
    report.artifacts = vec![
        ArtifactReport {
            kind: ArtifactKind::AudioOverview,
            success: false,
            error: Some("boom".into()),
        },
        ArtifactReport {
            kind: ArtifactKind::Infographic,
            success: true,
            error: None,
        },
    ];
    assert_eq!(report.generated(), vec![ArtifactKind::Infographic]);
}
