//! polyrpc Metrics Collection
//!
//! Thread-safe call metrics for polyrpc servers, plus the built-in monitoring
//! procedures every server answers.
//!
//! # Architecture
//!
//! - [`MetricsRegistry`]: atomic counters, per-method stats and latency histograms
//! - [`MetricsCollector`]: what the dispatcher and HTTP server talk to
//! - [`MetricsSnapshot`]: serializable view returned by `_metrics`
//!
//! # Built-in Procedures
//!
//! - **`_health`**: `{"status": "healthy"}`
//! - **`_info`**: service name, polyrpc version, uptime and method descriptors
//! - **`_metrics`**: the current [`MetricsSnapshot`]
//!
//! These are intercepted by the collector and never forwarded to the service.
//!
//! # Usage Example
//!
//! ```rust
//! use polyrpc_metrics::{MetricsCollector, ServiceMetricsCollector};
//! use std::time::Instant;
//!
//! let collector = ServiceMetricsCollector::new("SampleService", &[]);
//!
//! let start = Instant::now();
//! // ... execute the call ...
//! collector.record_call("SampleService_Add", start, true);
//!
//! let snapshot = collector.snapshot();
//! println!("Total requests: {}", snapshot.total_requests);
//! ```

mod collector;
mod registry;
mod snapshot;

pub use collector::{MetricsCollector, ServiceMetricsCollector};
pub use registry::{MetricsConfig, MetricsRegistry};
pub use snapshot::{MethodMetrics, MetricsSnapshot};
