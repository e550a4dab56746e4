//! HTTP Transport Utilities
//!
//! polyrpc carries one envelope per HTTP exchange: the request envelope is the
//! body of a POST, the response envelope is the body of the reply. The reply
//! status is always `200 OK`, including for JSON-RPC errors; the outcome lives
//! in the envelope.
//!
//! # Example
//!
//! ```
//! use polyrpc_common::transport::http::HttpEnvelope;
//! use polyrpc_common::protocol::JsonRpcResponse;
//! use hyper::StatusCode;
//! use serde_json::json;
//!
//! let response = JsonRpcResponse::success(json!(1), json!(5));
//! let http_response = HttpEnvelope::to_http_response(&response);
//! assert_eq!(http_response.status(), StatusCode::OK);
//! ```

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Request, Response};
use serde_json::Value;

use crate::codec::JsonCodec;
use crate::protocol::error::RpcError;
use crate::protocol::jsonrpc::JsonRpcResponse;

/// Type alias for Hyper incoming requests
pub type HyperRequest = Request<Incoming>;

/// Type alias for Hyper responses with full body
pub type HyperResponse = Response<Full<Bytes>>;

/// MIME type of every polyrpc body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Conversions between envelopes and HTTP messages.
pub struct HttpEnvelope;

impl HttpEnvelope {
    /// Wraps already encoded envelope bytes in a `200 OK` JSON response.
    pub fn from_bytes(body: Vec<u8>) -> HyperResponse {
        let mut response = Response::new(Full::new(Bytes::from(body)));
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        response
    }

    /// Encodes a response envelope into an HTTP response.
    pub fn to_http_response(jsonrpc: &JsonRpcResponse) -> HyperResponse {
        Self::from_bytes(JsonCodec::encode_response(jsonrpc))
    }

    /// Builds the HTTP response for a request that failed before dispatch.
    pub fn to_http_error(id: Value, error: &RpcError) -> HyperResponse {
        Self::to_http_response(&JsonRpcResponse::error(id, error.to_jsonrpc()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::StatusCode;
    use serde_json::json;

    async fn body_json(response: HyperResponse) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_to_http_response_success() {
        let jsonrpc_response = JsonRpcResponse::success(json!(1), json!({"note": "x"}));
        let http_response = HttpEnvelope::to_http_response(&jsonrpc_response);

        assert_eq!(http_response.status(), StatusCode::OK);
        assert_eq!(
            http_response.headers().get("Content-Type").unwrap(),
            "application/json"
        );
        let body = body_json(http_response).await;
        assert_eq!(body["result"]["note"], "x");
        assert_eq!(body["id"], 1);
    }

    #[tokio::test]
    async fn test_to_http_error_keeps_200() {
        let error = RpcError::method_not_found("SampleService_Nope");
        let http_response = HttpEnvelope::to_http_error(json!("abc"), &error);

        assert_eq!(http_response.status(), StatusCode::OK);
        let body = body_json(http_response).await;
        assert_eq!(body["error"]["code"], -32601);
        assert_eq!(body["id"], "abc");
        assert!(body.get("result").is_none());
    }
}
