//! JSON-RPC 2.0 Envelopes
//!
//! Request and response envelopes exchanged between polyrpc clients and servers.
//!
//! # Wire Format
//!
//! - Request: `{"jsonrpc": "2.0", "method": "...", "params": ..., "id": ...}`
//! - Success: `{"jsonrpc": "2.0", "result": ..., "id": ...}`
//! - Failure: `{"jsonrpc": "2.0", "error": {"code": ..., "message": "..."}, "id": ...}`
//!
//! A response carries exactly one of `result` and `error`. Note that a `null`
//! result is still a result: the field is present on the wire and is decoded as
//! `Some(Value::Null)`, distinct from an absent field.
//!
//! # Error Codes
//!
//! - `-32700`: Parse error
//! - `-32600`: Invalid request
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//! - `-32001`: Request too large
//! - `-32000`: Transport error (client side only, never sent by a server)
//!
//! Any other code is an application error chosen by the service implementation.
//!
//! # Example
//!
//! ```
//! use polyrpc_common::protocol::jsonrpc::{JsonRpcRequest, JsonRpcResponse, JsonRpcError};
//! use serde_json::json;
//!
//! let request = JsonRpcRequest::new("SampleService_Add", Some(json!([2, 3])));
//! let response = JsonRpcResponse::success(request.id.clone(), json!(5));
//! assert_eq!(response.into_result().unwrap(), json!(5));
//!
//! let failure = JsonRpcResponse::error(json!(1), JsonRpcError::method_not_found("Nope"));
//! assert!(failure.into_result().is_err());
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

/// The only protocol version polyrpc speaks.
pub const JSONRPC_VERSION: &str = "2.0";

// Standard JSON-RPC 2.0 error codes
/// Invalid JSON was received by the server
pub const PARSE_ERROR: i32 = -32700;
/// The JSON sent is not a valid Request object
pub const INVALID_REQUEST: i32 = -32600;
/// The method does not exist / is not available
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameter(s)
pub const INVALID_PARAMS: i32 = -32602;
/// Internal JSON-RPC error
pub const INTERNAL_ERROR: i32 = -32603;
/// Request entity too large
pub const REQUEST_TOO_LARGE: i32 = -32001;
/// Transport failure observed by the client
pub const TRANSPORT_ERROR: i32 = -32000;

static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// JSON-RPC 2.0 request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcRequest {
    /// JSON-RPC version; peers that omit it are treated as "2.0"
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    /// Qualified method name (`<Service>_<Operation>`)
    pub method: String,
    /// Encoded arguments; omitted for zero-argument calls
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub params: Option<Value>,
    /// Request identifier, echoed back in the response
    #[serde(default)]
    pub id: Value,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0" when produced by polyrpc)
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    /// Result value on success
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,
    /// Error object on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// Identifier of the request this answers
    #[serde(default)]
    pub id: Value,
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    /// Error code (standard codes are negative integers)
    pub code: i32,
    /// Short description of the error
    pub message: String,
    /// Additional data (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

fn default_version() -> String {
    JSONRPC_VERSION.to_string()
}

/// Keeps an explicit `null` as `Some(Value::Null)`; only a missing field is `None`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Generates a process-unique request id.
///
/// Upper 32 bits come from the wall clock, lower 32 bits from a counter, so ids
/// stay unique across threads and rarely collide across restarts.
pub fn next_request_id() -> u64 {
    let timestamp = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);

    let counter = REQUEST_ID_COUNTER.fetch_add(1, Ordering::SeqCst);

    (timestamp & 0xFFFF_FFFF_0000_0000) | (counter & 0xFFFF_FFFF)
}

impl JsonRpcRequest {
    /// Builds a request with a freshly generated numeric id.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self::with_id(method, params, Value::from(next_request_id()))
    }

    /// Builds a request with a caller-chosen id.
    pub fn with_id(method: impl Into<String>, params: Option<Value>, id: Value) -> Self {
        Self {
            jsonrpc: default_version(),
            method: method.into(),
            params,
            id,
        }
    }
}

impl JsonRpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create a parse error (-32700)
    pub fn parse_error(detail: &str) -> Self {
        Self::new(PARSE_ERROR, format!("Parse error: {}", detail))
    }

    /// Create an invalid request error (-32600)
    pub fn invalid_request(detail: &str) -> Self {
        Self::new(INVALID_REQUEST, format!("Invalid Request: {}", detail))
    }

    /// Create a method not found error (-32601)
    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    /// Create an invalid params error (-32602)
    pub fn invalid_params(msg: &str) -> Self {
        Self::new(INVALID_PARAMS, msg)
    }

    /// Create an internal error (-32603)
    pub fn internal_error(msg: &str) -> Self {
        Self::new(INTERNAL_ERROR, msg)
    }

    /// Create a request too large error (-32001)
    pub fn request_too_large(limit: usize) -> Self {
        Self::new(
            REQUEST_TOO_LARGE,
            format!("Request body too large (max {} bytes)", limit),
        )
    }

    /// Create an error with an application-defined code
    pub fn application(code: i32, msg: &str) -> Self {
        Self::new(code, msg)
    }
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: default_version(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Create an error response
    pub fn error(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: default_version(),
            result: None,
            error: Some(error),
            id,
        }
    }

    /// Splits the envelope into its outcome.
    ///
    /// Envelopes carrying both or neither of `result` / `error` are malformed and
    /// reported as an invalid-request error so callers have a single failure path.
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        match (self.result, self.error) {
            (Some(result), None) => Ok(result),
            (None, Some(error)) => Err(error),
            (Some(_), Some(_)) => Err(JsonRpcError::invalid_request(
                "response carries both result and error",
            )),
            (None, None) => Err(JsonRpcError::invalid_request(
                "response carries neither result nor error",
            )),
        }
    }
}
