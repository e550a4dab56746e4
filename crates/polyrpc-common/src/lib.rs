//! polyrpc Common Types and Transport
//!
//! This crate provides the wire protocol shared by every polyrpc client and
//! server.
//!
//! # Overview
//!
//! polyrpc exposes a service's operations as remote procedures. Clients call
//! through generated stubs, servers route incoming calls to the bound
//! implementation, and both sides agree on:
//!
//! - **Protocol Layer**: JSON-RPC 2.0 envelopes, error kinds and codes, the
//!   built-in `_health` / `_info` / `_metrics` procedures
//! - **Codec**: how arguments and results are written as JSON values
//! - **Service Contract**: the [`Dispatch`] trait a server drives
//! - **Transport Layer**: the [`Transport`] seam client stubs send through
//!
//! # Architecture
//!
//! - **Transport**: HTTP/1.1, one POST per call, always answered with `200 OK`
//! - **Serialization**: JSON
//! - **Method names**: `<Service>_<Operation>`
//!
//! # Example
//!
//! ```
//! use polyrpc_common::{JsonRpcRequest, JsonRpcResponse};
//! use polyrpc_common::codec::{self, JsonCodec};
//! use serde_json::json;
//!
//! // Create a request
//! let params = codec::encode_params(vec![json!(2), json!(3)]);
//! let request = JsonRpcRequest::new("SampleService_Add", params);
//! let bytes = JsonCodec::encode_request(&request).unwrap();
//!
//! // Process and create response
//! let request = JsonCodec::decode_request(&bytes).unwrap();
//! let response = JsonRpcResponse::success(request.id, json!(5));
//! assert_eq!(response.into_result().unwrap(), json!(5));
//! ```

pub mod codec;
pub mod protocol;
pub mod service;
pub mod transport;

pub use protocol::*;
pub use service::{Dispatch, MethodInfo};
pub use transport::Transport;
