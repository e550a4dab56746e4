//! Dispatcher for polyrpc services
//!
//! The dispatcher binds one service implementation (through its
//! [`Dispatch`] adapter) to incoming request envelopes. It is transport
//! agnostic: the HTTP server feeds it request bodies, and
//! [`LocalTransport`](crate::LocalTransport) feeds it bytes straight from a
//! client stub.
//!
//! # Request Handling
//!
//! - **Undecodable bodies**: parse error (-32700) or invalid request (-32600)
//! - **Built-in methods**: `_health`, `_info` and `_metrics` are answered by the
//!   metrics collector
//! - **Unknown methods**: method not found (-32601)
//! - **Service methods**: run on their own tokio task; a panic becomes an
//!   internal error (-32603) and the dispatcher keeps serving
//!
//! Every path produces a response envelope.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use polyrpc_common::codec::JsonCodec;
use polyrpc_common::protocol::jsonrpc::JSONRPC_VERSION;
use polyrpc_common::{Dispatch, ErrorKind, JsonRpcRequest, JsonRpcResponse, RpcError};
use polyrpc_metrics::{MetricsCollector, MetricsConfig, ServiceMetricsCollector};
use serde_json::Value;

/// Routes request envelopes to a bound service.
///
/// Cloning is cheap; clones share the service and the metrics.
#[derive(Clone)]
pub struct Dispatcher {
    service: Arc<dyn Dispatch>,
    metrics: Arc<dyn MetricsCollector>,
}

impl Dispatcher {
    /// Binds `service` with a fresh metrics collector.
    pub fn new<D: Dispatch>(service: D) -> Self {
        Self::with_metrics_config(service, MetricsConfig::default())
    }

    pub fn with_metrics_config<D: Dispatch>(service: D, config: MetricsConfig) -> Self {
        let metrics = ServiceMetricsCollector::with_config(
            service.service_name(),
            service.methods(),
            config,
        );
        Self::with_metrics(service, Arc::new(metrics))
    }

    /// Binds `service` with a caller-provided metrics collector.
    pub fn with_metrics<D: Dispatch>(service: D, metrics: Arc<dyn MetricsCollector>) -> Self {
        Self {
            service: Arc::new(service),
            metrics,
        }
    }

    pub fn service_name(&self) -> &'static str {
        self.service.service_name()
    }

    pub fn metrics(&self) -> &Arc<dyn MetricsCollector> {
        &self.metrics
    }

    /// Handles one encoded request envelope and returns the encoded response.
    pub async fn handle(&self, body: &[u8]) -> Vec<u8> {
        let response = match JsonCodec::decode_request(body) {
            Ok(request) => self.handle_request(request).await,
            Err(err) => {
                tracing::warn!("Rejected undecodable request: {}", err);
                self.metrics.record_rejected();
                JsonRpcResponse::error(JsonCodec::recover_id(body), err.to_jsonrpc())
            }
        };

        JsonCodec::encode_response(&response)
    }

    /// Handles one decoded request envelope.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let JsonRpcRequest {
            jsonrpc,
            method,
            params,
            id,
        } = request;

        if jsonrpc != JSONRPC_VERSION {
            tracing::warn!("Rejected request with jsonrpc version {:?}", jsonrpc);
            self.metrics.record_rejected();
            let err = RpcError::invalid_request(format!("unsupported jsonrpc version {:?}", jsonrpc));
            return JsonRpcResponse::error(id, err.to_jsonrpc());
        }

        if self.metrics.is_builtin(&method) {
            tracing::debug!("Built-in request {}", method);
            return respond(id, self.metrics.handle_builtin(&method));
        }

        if self.service.method(&method).is_none() {
            tracing::warn!("Method not found: {}", method);
            self.metrics.record_rejected();
            return respond(id, Err(RpcError::method_not_found(&method)));
        }

        tracing::debug!("Dispatching {} (id {})", method, id);
        let start = Instant::now();
        let outcome = self.invoke(&method, params).await;
        self.metrics.record_call(&method, start, outcome.is_ok());

        if let Err(err) = &outcome {
            match err.kind() {
                ErrorKind::InternalError => tracing::error!("{} failed: {}", method, err),
                _ => tracing::debug!("{} failed: {}", method, err),
            }
        }

        respond(id, outcome)
    }

    /// Runs the operation on its own task so a panic cannot take the caller down.
    async fn invoke(&self, method: &str, params: Option<Value>) -> Result<Value, RpcError> {
        let call = self.service.dispatch(method, params);

        match tokio::spawn(call).await {
            Ok(outcome) => outcome,
            Err(err) if err.is_panic() => {
                tracing::error!(
                    "{} panicked: {}",
                    method,
                    panic_message(err.into_panic().as_ref())
                );
                Err(RpcError::internal(format!(
                    "internal error while handling {}",
                    method
                )))
            }
            Err(err) => Err(RpcError::internal(format!("{} was cancelled: {}", method, err))),
        }
    }
}

fn respond(id: Value, outcome: Result<Value, RpcError>) -> JsonRpcResponse {
    match outcome {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(err) => JsonRpcResponse::error(id, err.to_jsonrpc()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
