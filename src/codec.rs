//! batchexecute request encoding and response decoding.
//!
//! Requests carry a single form field, `f.req`, holding a JSON envelope of the shape
//! `[[[method_id, "<params as JSON text>", null, "generic"]]]`.
//!
//! Responses start with the anti-hijacking prefix `)]}'` followed by newline-delimited
//! frames. Control frames (length markers, metadata) are mixed with data frames; a data
//! frame is a JSON array whose first element is itself an array with the real payload,
//! JSON-encoded as a string, at index 2:
//!
//! ```text
//! )]}'
//!
//! 104
//! [["wrb.fr","CCqFvf","[\"title\",null,\"a1b2c3d4e5f6\"]",null,null,null,"generic"]]
//! 25
//! [["e",4,null,null,140]]
//! ```

use crate::error::Result;
use crate::types::RpcMethod;
use serde_json::Value;

/// Anti-JSON-hijacking prefix line, including its newline
pub const RESPONSE_PREFIX: &str = ")]}'\n";

/// Build the request envelope for `method` and `params`
pub fn envelope(method: RpcMethod, params: &Value) -> Result<Value> {
    let params_json = serde_json::to_string(params)?;
    Ok(serde_json::json!([[[
        method.id(),
        params_json,
        Value::Null,
        "generic"
    ]]]))
}

/// Encode a call as the `f.req=<url-encoded envelope>` body field
///
/// The caller appends any further fields (the anti-forgery token) with `&`.
pub fn encode(method: RpcMethod, params: &Value) -> Result<String> {
    let envelope = serde_json::to_string(&envelope(method, params)?)?;
    Ok(format!("f.req={}", urlencoding::encode(&envelope)))
}

/// Decode a raw response body into its payload
///
/// Returns the first data frame's payload. Lines that are not JSON, or JSON without a
/// payload string, are skipped. `None` means the response held no usable payload; it
/// is not an error.
pub fn decode(raw: &str) -> Option<Value> {
    let body = raw.strip_prefix(RESPONSE_PREFIX).unwrap_or(raw);

    body.lines()
        .map(str::trim_end)
        .filter(|line| line.starts_with('['))
        .find_map(payload_of_frame)
}

fn payload_of_frame(line: &str) -> Option<Value> {
    let frame: Value = serde_json::from_str(line).ok()?;
    let payload = frame.get(0)?.get(2)?.as_str()?;
    if payload.is_empty() {
        return None;
    }
    serde_json::from_str(payload).ok()
}
