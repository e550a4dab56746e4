// Copyright 2026 polyrpc Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::registry::{MetricsConfig, MetricsRegistry};
use crate::snapshot::MetricsSnapshot;
use polyrpc_common::codec;
use polyrpc_common::protocol::builtin::{
    is_builtin, HealthResponse, InfoResponse, HEALTH_METHOD, INFO_METHOD, METRICS_METHOD,
};
use polyrpc_common::{MethodInfo, RpcError};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Metrics collection as seen by a dispatcher and a server.
///
/// Implementations answer the built-in procedures (`_health`, `_info`,
/// `_metrics`) and record every other call. Built-in requests are intercepted
/// before the service is consulted and never reach user code.
pub trait MetricsCollector: Send + Sync {
    /// Returns `true` for method names answered by the collector itself.
    fn is_builtin(&self, method: &str) -> bool {
        is_builtin(method)
    }

    /// Produces the result of a built-in procedure.
    fn handle_builtin(&self, method: &str) -> Result<Value, RpcError>;

    /// Records a finished call to `method` started at `start_time`.
    fn record_call(&self, method: &str, start_time: Instant, success: bool);

    /// Records a request rejected before a method could be resolved.
    fn record_rejected(&self);

    fn connection_opened(&self);

    fn connection_closed(&self);

    fn snapshot(&self) -> MetricsSnapshot;
}

/// Metrics collector for a server bound to one service.
///
/// # Example
///
/// ```rust
/// use polyrpc_metrics::{MetricsCollector, ServiceMetricsCollector};
/// use std::time::Instant;
///
/// let collector = ServiceMetricsCollector::new("SampleService", &[]);
///
/// let start = Instant::now();
/// collector.record_call("SampleService_Add", start, true);
/// collector.record_call("SampleService_Add", start, false);
///
/// let snapshot = collector.snapshot();
/// assert_eq!(snapshot.total_requests, 2);
///
/// let info = collector.handle_builtin("_info").unwrap();
/// assert_eq!(info["service"], "SampleService");
/// ```
pub struct ServiceMetricsCollector {
    registry: Arc<MetricsRegistry>,
    service: &'static str,
    methods: &'static [MethodInfo],
}

impl ServiceMetricsCollector {
    pub fn new(service: &'static str, methods: &'static [MethodInfo]) -> Self {
        Self::with_registry(service, methods, Arc::new(MetricsRegistry::new()))
    }

    pub fn with_config(
        service: &'static str,
        methods: &'static [MethodInfo],
        config: MetricsConfig,
    ) -> Self {
        Self::with_registry(service, methods, Arc::new(MetricsRegistry::with_config(config)))
    }

    /// Uses an existing registry, e.g. one shared with an embedding application.
    pub fn with_registry(
        service: &'static str,
        methods: &'static [MethodInfo],
        registry: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            registry,
            service,
            methods,
        }
    }

    pub fn registry(&self) -> &Arc<MetricsRegistry> {
        &self.registry
    }

    pub fn info(&self) -> InfoResponse {
        InfoResponse {
            service: self.service.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_ms: self.registry.uptime_ms(),
            methods: self.methods,
        }
    }
}

impl MetricsCollector for ServiceMetricsCollector {
    fn handle_builtin(&self, method: &str) -> Result<Value, RpcError> {
        match method {
            HEALTH_METHOD => codec::encode(&HealthResponse::healthy()),
            INFO_METHOD => codec::encode(&self.info()),
            METRICS_METHOD => codec::encode(&self.snapshot()),
            other => Err(RpcError::method_not_found(other)),
        }
    }

    fn record_call(&self, method: &str, start_time: Instant, success: bool) {
        let latency_us = start_time.elapsed().as_micros() as u64;
        self.registry.record_method_call(method, latency_us, success);
    }

    fn record_rejected(&self) {
        self.registry.record_rejected();
    }

    fn connection_opened(&self) {
        self.registry.increment_active_connections();
    }

    fn connection_closed(&self) {
        self.registry.decrement_active_connections();
    }

    fn snapshot(&self) -> MetricsSnapshot {
        self.registry.snapshot()
    }
}
