//! Message Codec
//!
//! Converts Rust values to and from their wire form. Two layers:
//!
//! - **Values**: [`encode`] / [`decode`] turn arguments and results into
//!   `serde_json::Value` and back. Any `Serialize + DeserializeOwned` type works;
//!   the shapes used by services are scalars, records (see `rpc_record!` in the
//!   `polyrpc` crate), lists of records and `HashMap<String, String>`.
//! - **Envelopes**: [`JsonCodec`] turns whole request/response envelopes into
//!   the bytes of an HTTP body and back.
//!
//! Encoding is deterministic: every value passes through `serde_json::Value`,
//! whose objects write their keys in a fixed order, so equal records and equal
//! maps always produce equal bytes. Decoders accept fields in any order.
//!
//! # Example
//!
//! ```
//! use polyrpc_common::codec;
//! use std::collections::HashMap;
//!
//! let mut params = HashMap::new();
//! params.insert("key1".to_string(), "val1".to_string());
//!
//! let wire = codec::encode(&params).unwrap();
//! let back: HashMap<String, String> = codec::decode(wire).unwrap();
//! assert_eq!(back, params);
//!
//! // Shape mismatch
//! let wire = codec::encode(&"not a number").unwrap();
//! assert!(codec::decode::<i64>(wire).is_err());
//! ```

mod params;

pub use params::{encode_params, Params};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::protocol::error::RpcError;
use crate::protocol::jsonrpc::{JsonRpcRequest, JsonRpcResponse};

/// A wire value did not have the shape the receiver expected.
#[derive(Error, Debug)]
#[error("cannot decode {expected}: {source}")]
pub struct DecodeError {
    expected: &'static str,
    #[source]
    source: serde_json::Error,
}

impl DecodeError {
    /// Rust type name the value was decoded into.
    pub fn expected(&self) -> &'static str {
        self.expected
    }
}

impl From<DecodeError> for RpcError {
    fn from(err: DecodeError) -> Self {
        RpcError::invalid_params(err.to_string())
    }
}

/// The success result of an operation without a return value.
///
/// Servers send `true`; clients ignore whatever value arrives.
pub fn void_result() -> Value {
    Value::Bool(true)
}

/// Encodes a value into its wire form.
///
/// Fails only for values JSON cannot represent (maps with non-string keys,
/// non-finite floats are written as `null`); the failure is an internal error
/// because it reflects a bug on the encoding side, never bad input.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Value, RpcError> {
    serde_json::to_value(value)
        .map_err(|e| RpcError::internal(format!("failed to encode value: {}", e)))
}

/// Decodes a wire value into the expected shape.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, DecodeError> {
    serde_json::from_value(value).map_err(|source| DecodeError {
        expected: std::any::type_name::<T>(),
        source,
    })
}

/// Writes a whole envelope (or any value) as JSON text.
pub fn to_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, RpcError> {
    serde_json::to_vec(value)
        .map_err(|e| RpcError::internal(format!("failed to encode message: {}", e)))
}

/// Reads one JSON document from a message body.
pub fn from_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, DecodeError> {
    serde_json::from_slice(data).map_err(|source| DecodeError {
        expected: std::any::type_name::<T>(),
        source,
    })
}

/// JSON codec for envelopes.
///
/// Decoding a request distinguishes the two `BadRequest` flavours: bytes that
/// are not JSON at all (`-32700`) and JSON that is not a request object
/// (`-32600`).
pub struct JsonCodec;

impl JsonCodec {
    pub fn encode_request(request: &JsonRpcRequest) -> Result<Vec<u8>, RpcError> {
        to_bytes(request)
    }

    pub fn decode_request(data: &[u8]) -> Result<JsonRpcRequest, RpcError> {
        let value: Value = serde_json::from_slice(data).map_err(RpcError::parse_error)?;
        if !value.is_object() {
            return Err(RpcError::invalid_request("expected a JSON object"));
        }
        serde_json::from_value(value).map_err(RpcError::invalid_request)
    }

    /// Encodes a response envelope.
    ///
    /// Envelopes only hold JSON values, so serialization cannot fail in practice;
    /// should it ever, a fixed internal-error envelope is written instead so a
    /// body is always produced.
    pub fn encode_response(response: &JsonRpcResponse) -> Vec<u8> {
        to_bytes(response).unwrap_or_else(|_| {
            br#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"failed to encode response"},"id":null}"#
                .to_vec()
        })
    }

    pub fn decode_response(data: &[u8]) -> Result<JsonRpcResponse, RpcError> {
        from_slice(data)
            .map_err(|e| RpcError::transport(format!("malformed response envelope: {}", e)))
    }

    /// Best-effort recovery of the `id` of a request that failed to decode.
    pub fn recover_id(data: &[u8]) -> Value {
        from_slice::<Value>(data)
            .ok()
            .and_then(|v| v.get("id").cloned())
            .unwrap_or(Value::Null)
    }
}
