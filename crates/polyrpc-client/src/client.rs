use std::fmt;
use std::sync::Arc;

use polyrpc_common::codec::{self, encode_params, JsonCodec};
use polyrpc_common::{JsonRpcRequest, Result, RpcError, Transport};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::http::HttpTransport;

/// polyrpc client for making RPC calls
///
/// Wraps a [`Transport`] with request envelope handling: every call gets a
/// fresh id, the response id is checked against it and error objects are
/// turned back into [`RpcError`]s. Clones share the transport, so a clone per
/// task is cheap and calls from different tasks run concurrently.
pub struct RpcClient<T: Transport = HttpTransport> {
    transport: Arc<T>,
}

impl RpcClient<HttpTransport> {
    /// Create a client for the endpoint at `url`
    ///
    /// No connection is made until the first call.
    pub fn connect(url: &str) -> Result<Self> {
        Ok(Self::new(HttpTransport::new(url)?))
    }

    pub fn connect_with_config(url: &str, config: ClientConfig) -> Result<Self> {
        Ok(Self::new(HttpTransport::with_config(url, config)?))
    }
}

impl<T: Transport> RpcClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Call `method` with already-encoded params and return the raw result.
    pub async fn call_raw(&self, method: &str, params: Option<Value>) -> std::result::Result<Value, RpcError> {
        let request = JsonRpcRequest::new(method, params);
        let body = JsonCodec::encode_request(&request)?;

        debug!(method, id = %request.id, "Sending request to {}", self.transport.describe());
        let bytes = self.transport.round_trip(body).await?;
        let response = JsonCodec::decode_response(&bytes)?;

        // Servers answer with a null id when they could not read the request at all
        let id_matches = response.id == request.id || (response.id.is_null() && response.error.is_some());
        if !id_matches {
            return Err(RpcError::transport(format!(
                "response id {} does not match request id {}",
                response.id, request.id
            )));
        }

        match (response.result, response.error) {
            (Some(result), None) => Ok(result),
            (None, Some(error)) => {
                let error = RpcError::from(error);
                debug!(method, code = error.code(), "Call failed: {}", error.message());
                Err(error)
            }
            (Some(_), Some(_)) => Err(RpcError::transport(
                "malformed response envelope: both result and error present",
            )),
            (None, None) => Err(RpcError::transport(
                "malformed response envelope: neither result nor error present",
            )),
        }
    }

    /// Call `method` with positional arguments and decode the result as `R`.
    ///
    /// ```no_run
    /// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
    /// use polyrpc_client::RpcClient;
    /// use serde_json::json;
    ///
    /// let client = RpcClient::connect("http://127.0.0.1:9009")?;
    /// let sum: i64 = client.call("SampleService_Add", vec![json!(2), json!(3)]).await?;
    /// assert_eq!(sum, 5);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn call<R: DeserializeOwned>(&self, method: &str, args: Vec<Value>) -> std::result::Result<R, RpcError> {
        let result = self.call_raw(method, encode_params(args)).await?;
        codec::decode(result).map_err(|e| {
            RpcError::transport(format!("undecodable result from {}: {}", method, e))
        })
    }

    /// Call a method that returns nothing.
    ///
    /// Whatever result the peer sends is discarded.
    pub async fn call_void(&self, method: &str, args: Vec<Value>) -> std::result::Result<(), RpcError> {
        self.call_raw(method, encode_params(args)).await.map(|_| ())
    }
}

impl<T: Transport> Clone for RpcClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> fmt::Debug for RpcClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcClient")
            .field("transport", &self.transport.describe())
            .finish()
    }
}
