//! polyrpc Transport Layer
//!
//! A [`Transport`] carries one encoded request envelope to a server and brings
//! back the encoded response envelope. Client stubs only ever talk to this
//! trait, so the same stub works over HTTP or against an in-process dispatcher.
//!
//! # Components
//!
//! - **[`Transport`]**: the client-side seam
//! - **[`http`]**: helpers for building HTTP responses around envelopes, shared
//!   by the server and by test servers

pub mod http;

use futures::future::BoxFuture;
use std::sync::Arc;

use crate::protocol::error::RpcError;

pub use http::{HttpEnvelope, HyperRequest, HyperResponse};

/// Moves request bytes to a server and returns the response bytes.
///
/// Implementations report every failure to produce a response body (connection
/// refused, timeout, non-success status) as a transport error. Interpreting
/// the body is left to the caller.
pub trait Transport: Send + Sync + 'static {
    fn round_trip(&self, body: Vec<u8>) -> BoxFuture<'_, Result<Vec<u8>, RpcError>>;

    /// Human-readable peer description used in logs.
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn round_trip(&self, body: Vec<u8>) -> BoxFuture<'_, Result<Vec<u8>, RpcError>> {
        (**self).round_trip(body)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
