//! Derivative artifact generation.
//!
//! Each [`ArtifactKind`] maps to one create-artifact call whose parameter tree embeds
//! the notebook's source ids. Both kinds reference the sources through a triple-nested
//! slot; audio overviews additionally carry a doubly-nested copy inside their options.

use serde_json::{Value, json};

use crate::config::ArtifactConfig;
use crate::error::Result;
use crate::rpc::RpcClient;
use crate::types::{ArtifactKind, AuthContext, ContainerId, ItemId, RpcMethod};

/// Project type marker shared by every notebook-scoped call
pub(crate) const PROJECT_TYPE: u8 = 2;

/// Infographic options sit after ten empty slots following the source references
const INFOGRAPHIC_PADDING: usize = 10;

fn triple(ids: &[ItemId]) -> Value {
    Value::Array(ids.iter().map(|id| json!([[[id.as_str()]]])).collect())
}

fn double(ids: &[ItemId]) -> Value {
    Value::Array(ids.iter().map(|id| json!([[id.as_str()]])).collect())
}

/// Build the create-artifact parameter tree for `kind`
pub fn build_params(
    kind: ArtifactKind,
    container: &ContainerId,
    ids: &[ItemId],
    config: &ArtifactConfig,
) -> Value {
    match kind {
        ArtifactKind::AudioOverview => json!([
            [PROJECT_TYPE],
            container.as_str(),
            [
                null,
                null,
                kind.type_code(),
                triple(ids),
                null,
                null,
                [
                    null,
                    [
                        null,
                        config.audio_length.code(),
                        null,
                        double(ids),
                        config.language,
                        null,
                        config.audio_format
                    ]
                ]
            ]
        ]),
        ArtifactKind::Infographic => {
            let mut options = vec![Value::Null, Value::Null, json!(kind.type_code()), triple(ids)];
            options.extend(std::iter::repeat_n(Value::Null, INFOGRAPHIC_PADDING));
            options.push(json!([[
                null,
                config.language,
                null,
                config.infographic_orientation,
                config.infographic_detail_level
            ]]));

            json!([[PROJECT_TYPE], container.as_str(), options])
        }
    }
}

/// Request generation of one artifact
///
/// The caller aggregates outcomes across kinds; a failure here only concerns `kind`.
#[tracing::instrument(skip(rpc, container, ids, auth, config), fields(container = %container, sources = ids.len()))]
pub async fn generate(
    rpc: &RpcClient,
    kind: ArtifactKind,
    container: &ContainerId,
    ids: &[ItemId],
    auth: &AuthContext,
    config: &ArtifactConfig,
) -> Result<Option<Value>> {
    tracing::info!(%kind, "requesting artifact generation");
    let params = build_params(kind, container, ids, config);
    rpc.call(RpcMethod::CreateArtifact, &params, auth).await
}
