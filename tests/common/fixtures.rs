//! Mock NotebookLM service and response fixtures

use nlm_ingest::{Event, ItemSource, RpcMethod};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::broadcast::Receiver;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// batchexecute path under the mock server
pub const RPC_PATH: &str = "/_/LabsTailwindUi/data/batchexecute";

/// Notebook id the mock service assigns
pub const NOTEBOOK_ID: &str = "5e6f7a8b-9c0d-4e1f-a2b3-c4d5e6f7a8b9";

/// Landing page embedding `token` (and a session id)
pub fn landing_page(token: &str) -> String {
    format!(
        r#"<!doctype html><html><head><script>window.WIZ_global_data = {{"FdrFJe":"-4242424242","SNlM0e":"{token}","cfb2h":"boq_labs-tailwind"}};</script></head><body></body></html>"#
    )
}

/// A batchexecute response body carrying `payload` in one data frame, with the
/// length-marker and trailer noise real responses have
pub fn rpc_body(method: RpcMethod, payload: &Value) -> String {
    let frame = json!([["wrb.fr", method.id(), payload.to_string(), null, null, null, "generic"]]);
    format!(")]}}'\n\n{}\n{}\n25\n[[\"e\",4,null,null,140]]\n", frame.to_string().len(), frame)
}

/// Source id the mock service assigns to the `i`-th item
pub fn source_id(i: usize) -> String {
    format!("{i:02}d3c2b1a-0f9e-8d7c-6b5a-4f3e2d1c0b9a")
}

/// A get-container payload listing `n` sources
pub fn notebook_payload(n: usize) -> Value {
    let sources: Vec<Value> = (0..n)
        .map(|i| {
            json!([
                [source_id(i)],
                format!("Video number {i}"),
                [null, 1, [1_718_000_000, 0], null, 9],
                format!("https://www.youtube.com/watch?v=vid{i:08}")
            ])
        })
        .collect();
    json!([["YouTube動画 (2025/1/1)", sources, NOTEBOOK_ID, "📺"]])
}

/// `n` item sources with distinct video URLs
pub fn items(n: usize) -> Vec<ItemSource> {
    (0..n)
        .map(|i| {
            ItemSource::new(
                format!("vid{i:08}"),
                format!("Video number {i}"),
                format!("https://www.youtube.com/watch?v=vid{i:08}"),
            )
        })
        .collect()
}

/// Matches create-artifact requests whose parameter tree carries `type_code`
pub struct ArtifactTypeIs(pub u64);

impl Match for ArtifactTypeIs {
    fn matches(&self, request: &Request) -> bool {
        artifact_type_code(&request.body) == Some(self.0)
    }
}

fn artifact_type_code(body: &[u8]) -> Option<u64> {
    let body = std::str::from_utf8(body).ok()?;
    let encoded = body.split('&').find_map(|field| field.strip_prefix("f.req="))?;
    let envelope: Value = serde_json::from_str(&urlencoding::decode(encoded).ok()?).ok()?;
    let params: Value = serde_json::from_str(envelope[0][0][1].as_str()?).ok()?;
    params[2][2].as_u64()
}

/// Builder for the mock service endpoints a run touches
pub struct MockService {
    /// Underlying mock server
    pub server: MockServer,
}

impl MockService {
    /// Start a mock service with no endpoints mounted
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Serve the landing page with `token`
    pub async fn credentials(&self, token: &str) -> &Self {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(landing_page(token)))
            .mount(&self.server)
            .await;
        self
    }

    /// Assert that no RPC call is made at all
    pub async fn no_rpc(&self) -> &Self {
        Mock::given(method("POST"))
            .and(path(RPC_PATH))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.server)
            .await;
        self
    }

    /// Notebook creation succeeds with [`NOTEBOOK_ID`]
    pub async fn create_container(&self) -> &Self {
        self.rpc(
            RpcMethod::CreateContainer,
            json!(["YouTube動画", null, NOTEBOOK_ID, null, [2]]),
        )
        .await
    }

    /// Every add-item call succeeds after `latency`
    pub async fn add_items(&self, expected_calls: u64, latency: Duration) -> &Self {
        Mock::given(method("POST"))
            .and(path(RPC_PATH))
            .and(query_param("rpcids", RpcMethod::AddItem.id()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(rpc_body(RpcMethod::AddItem, &json!([[["ok"]]])))
                    .set_delay(latency),
            )
            .expect(expected_calls)
            .mount(&self.server)
            .await;
        self
    }

    /// The first `empty_polls` get-container calls list no sources, later ones list `n`
    pub async fn notebook(&self, empty_polls: u64, n: usize) -> &Self {
        if empty_polls > 0 {
            Mock::given(method("POST"))
                .and(path(RPC_PATH))
                .and(query_param("rpcids", RpcMethod::GetContainer.id()))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(rpc_body(RpcMethod::GetContainer, &notebook_payload(0))),
                )
                .up_to_n_times(empty_polls)
                .with_priority(1)
                .mount(&self.server)
                .await;
        }
        self.rpc(RpcMethod::GetContainer, notebook_payload(n)).await
    }

    /// Create-artifact calls for `type_code` answer with `status`
    pub async fn artifact(&self, type_code: u64, status: u16, expected_calls: u64) -> &Self {
        Mock::given(method("POST"))
            .and(path(RPC_PATH))
            .and(query_param("rpcids", RpcMethod::CreateArtifact.id()))
            .and(ArtifactTypeIs(type_code))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_string(rpc_body(RpcMethod::CreateArtifact, &json!(["artifact-1"]))),
            )
            .expect(expected_calls)
            .mount(&self.server)
            .await;
        self
    }

    /// No create-artifact call may be made
    pub async fn no_artifacts(&self) -> &Self {
        Mock::given(method("POST"))
            .and(path(RPC_PATH))
            .and(query_param("rpcids", RpcMethod::CreateArtifact.id()))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.server)
            .await;
        self
    }

    async fn rpc(&self, rpc: RpcMethod, payload: Value) -> &Self {
        Mock::given(method("POST"))
            .and(path(RPC_PATH))
            .and(query_param("rpcids", rpc.id()))
            .respond_with(ResponseTemplate::new(200).set_body_string(rpc_body(rpc, &payload)))
            .mount(&self.server)
            .await;
        self
    }
}

/// Drain every event already delivered to `rx`
pub fn collect_events(rx: &mut Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Notification messages in delivery order
pub fn notifications(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Notification { message, .. } => Some(message.clone()),
            _ => None,
        })
        .collect()
}
