//! JSON-RPC framing for the MCP `tools/list` call.

use crate::monitor::domain::ToolDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// JSON-RPC method listing a server's tools.
pub const TOOLS_LIST_METHOD: &str = "tools/list";

const JSONRPC_VERSION: &str = "2.0";
const SSE_DATA_PREFIX: &str = "data:";

/// Request envelope sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: Map<String, Value>,
}

impl JsonRpcRequest {
    /// Builds the `tools/list` request with empty params.
    #[must_use]
    pub fn tools_list() -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: 1,
            method: TOOLS_LIST_METHOD,
            params: Map::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<ToolsListResult>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ToolsListResult {
    tools: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTool {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "type")]
    tool_type: Option<String>,
    #[serde(default)]
    input_schema: Option<Value>,
    #[serde(default)]
    output_schema: Option<Value>,
}

/// Why a `tools/list` body could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload was not a JSON-RPC response envelope.
    #[error("invalid JSON-RPC payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The server answered with a JSON-RPC error object.
    #[error("JSON-RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },

    /// The envelope carried neither `result` nor `error`.
    #[error("JSON-RPC response has no result")]
    MissingResult,
}

/// Decodes a `tools/list` response body into tool descriptors.
///
/// SSE-framed bodies are unwrapped to their first `data:` payload. A result
/// without a `tools` member is rejected rather than read as an empty catalog.
/// Entries without a usable name are skipped.
///
/// # Errors
///
/// Returns [`DecodeError`] for malformed envelopes, JSON-RPC errors, and
/// responses without a result.
pub fn decode_tools_list(body: &str) -> Result<Vec<ToolDescriptor>, DecodeError> {
    let response: JsonRpcResponse = serde_json::from_str(json_payload(body))?;
    if let Some(error) = response.error {
        return Err(DecodeError::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    let result = response.result.ok_or(DecodeError::MissingResult)?;
    Ok(result.tools.into_iter().filter_map(descriptor_from_entry).collect())
}

fn json_payload(body: &str) -> &str {
    let trimmed = body.trim_start();
    if trimmed.starts_with('{') {
        return trimmed;
    }
    trimmed
        .lines()
        .find_map(|line| line.strip_prefix(SSE_DATA_PREFIX))
        .map_or(trimmed, str::trim)
}

fn descriptor_from_entry(entry: Value) -> Option<ToolDescriptor> {
    let wire: WireTool = match serde_json::from_value(entry) {
        Ok(wire) => wire,
        Err(err) => {
            debug!(reason = %err, "skipping undecodable tool entry");
            return None;
        }
    };
    let name = wire.name?;
    let mut descriptor = match ToolDescriptor::new(name, wire.description.unwrap_or_default()) {
        Ok(descriptor) => descriptor,
        Err(err) => {
            debug!(reason = %err, "skipping tool entry without a usable name");
            return None;
        }
    };
    if let Some(tool_type) = wire.tool_type {
        descriptor = descriptor.with_tool_type(tool_type);
    }
    if let Some(schema) = wire.input_schema {
        descriptor = descriptor.with_input_schema(schema);
    }
    if let Some(schema) = wire.output_schema {
        descriptor = descriptor.with_output_schema(schema);
    }
    Some(descriptor)
}
