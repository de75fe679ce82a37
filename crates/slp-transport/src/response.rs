//! gs++ response body decoding.
//!
//! Successful responses carry the payload key (`txdata` or `valid`). Anything
//! else is an error: the server's `error` string when present, otherwise the
//! raw body.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct GraphSearchResponse {
    txdata: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TrustedValidationResponse {
    valid: bool,
}

/// Decode a graph search body into its base64-encoded raw transactions.
pub fn parse_graph_search_response(body: &[u8]) -> Result<Vec<String>> {
    match serde_json::from_slice::<GraphSearchResponse>(body) {
        Ok(resp) => Ok(resp.txdata),
        Err(_) => Err(server_error(body)),
    }
}

/// Decode a trusted validation body into the validity flag.
pub fn parse_trusted_validation_response(body: &[u8]) -> Result<bool> {
    match serde_json::from_slice::<TrustedValidationResponse>(body) {
        Ok(resp) => Ok(resp.valid),
        Err(_) => Err(server_error(body)),
    }
}

/// Error for a body that did not carry the expected payload.
pub fn server_error(body: &[u8]) -> anyhow::Error {
    let text = String::from_utf8_lossy(body);
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) {
        match map.get("error") {
            Some(Value::String(msg)) if !msg.is_empty() => return anyhow!("{}", msg),
            Some(Value::Null) | Some(Value::Bool(false)) | None => {}
            Some(other) => return anyhow!("{}", other),
        }
    }
    anyhow!("{}", text)
}
