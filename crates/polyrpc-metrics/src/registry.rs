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

use crate::snapshot::{MethodMetrics, MetricsSnapshot};
use polyrpc_common::PolyrpcError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// Decades covered by the latency histogram (1µs up to 10^10µs).
const DECADES: usize = 10;
/// Bins per decade: one per leading digit 1..=9.
const BINS_PER_DECADE: usize = 9;
/// Bin 0 holds zero-latency samples.
const NUM_HISTOGRAM_BINS: usize = 1 + DECADES * BINS_PER_DECADE;

/// Limits on what the registry keeps.
///
/// # Example
///
/// ```rust
/// use polyrpc_metrics::MetricsConfig;
///
/// let config = MetricsConfig::default().with_max_methods(64);
/// assert!(config.validate().is_ok());
/// assert!(MetricsConfig::default().with_max_methods(0).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Maximum number of distinct method names tracked
    ///
    /// When this limit is reached, the least-recently-used method is evicted.
    pub max_methods: usize,
}

impl MetricsConfig {
    pub fn with_max_methods(mut self, max_methods: usize) -> Self {
        self.max_methods = max_methods;
        self
    }

    pub fn validate(&self) -> Result<(), PolyrpcError> {
        if self.max_methods == 0 {
            return Err(PolyrpcError::InvalidConfig(
                "max_methods must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { max_methods: 1000 }
    }
}

/// Log-linear latency histogram.
///
/// Each decade is split into nine bins by leading digit, so the relative error
/// of a percentile estimate stays bounded at every scale. Recording is a
/// couple of relaxed atomic increments.
#[derive(Debug)]
struct LatencyHistogram {
    bins: [AtomicU64; NUM_HISTOGRAM_BINS],
    total_latency: AtomicU64,
    sample_count: AtomicU64,
}

impl LatencyHistogram {
    fn new() -> Self {
        Self {
            bins: std::array::from_fn(|_| AtomicU64::new(0)),
            total_latency: AtomicU64::new(0),
            sample_count: AtomicU64::new(0),
        }
    }

    fn record(&self, latency_us: u64) {
        self.bins[Self::latency_to_bin(latency_us)].fetch_add(1, Ordering::Relaxed);
        self.total_latency.fetch_add(latency_us, Ordering::Relaxed);
        self.sample_count.fetch_add(1, Ordering::Relaxed);
    }

    fn latency_to_bin(latency_us: u64) -> usize {
        if latency_us == 0 {
            return 0;
        }
        let decade = latency_us.ilog10() as usize;
        if decade >= DECADES {
            return NUM_HISTOGRAM_BINS - 1;
        }
        let leading = (latency_us / 10u64.pow(decade as u32)) as usize;
        1 + decade * BINS_PER_DECADE + (leading - 1)
    }

    /// Lower bound of a bin.
    fn bin_start(bin: usize) -> u64 {
        if bin == 0 {
            return 0;
        }
        let decade = (bin - 1) / BINS_PER_DECADE;
        let leading = (bin - 1) % BINS_PER_DECADE + 1;
        leading as u64 * 10u64.pow(decade as u32)
    }

    /// Upper bound of a bin (the start of the next one).
    fn bin_end(bin: usize) -> u64 {
        if bin == 0 {
            return 1;
        }
        if bin + 1 >= NUM_HISTOGRAM_BINS {
            return Self::bin_start(bin);
        }
        Self::bin_start(bin + 1)
    }

    /// Estimates the latency at `percentile` (0-100), interpolating inside the
    /// bin that contains it.
    fn estimate_percentile(&self, percentile: u64) -> u64 {
        let total = self.sample_count.load(Ordering::Relaxed);
        if total == 0 {
            return 0;
        }

        let target = ((total * percentile + 99) / 100).max(1);
        let mut cumulative = 0;

        for (bin, counter) in self.bins.iter().enumerate() {
            let count = counter.load(Ordering::Relaxed);
            if count > 0 && cumulative + count >= target {
                let start = Self::bin_start(bin) as f64;
                let end = Self::bin_end(bin) as f64;
                let fraction = (target - cumulative) as f64 / count as f64;
                return (start + fraction * (end - start)) as u64;
            }
            cumulative += count;
        }

        Self::bin_start(NUM_HISTOGRAM_BINS - 1)
    }

    /// Returns `(avg, p50, p95, p99)` in microseconds, all zero without samples.
    fn calculate_percentiles(&self) -> (u64, u64, u64, u64) {
        let total = self.sample_count.load(Ordering::Relaxed);
        if total == 0 {
            return (0, 0, 0, 0);
        }

        let avg = self.total_latency.load(Ordering::Relaxed) / total;
        (
            avg,
            self.estimate_percentile(50),
            self.estimate_percentile(95),
            self.estimate_percentile(99),
        )
    }
}

/// Per-method counters.
#[derive(Debug)]
struct MethodStats {
    call_count: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    latencies: LatencyHistogram,
    /// Logical clock value of the last call, for LRU eviction
    last_access: AtomicU64,
}

impl MethodStats {
    fn new(now: u64) -> Self {
        Self {
            call_count: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            latencies: LatencyHistogram::new(),
            last_access: AtomicU64::new(now),
        }
    }

    fn record(&self, latency_us: u64, success: bool, now: u64) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if success {
            self.success_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        }
        self.latencies.record(latency_us);
        self.last_access.store(now, Ordering::Relaxed);
    }

    fn snapshot(&self) -> MethodMetrics {
        let (avg_latency_us, p50_latency_us, p95_latency_us, p99_latency_us) =
            self.latencies.calculate_percentiles();

        MethodMetrics {
            call_count: self.call_count.load(Ordering::Relaxed),
            success_count: self.success_count.load(Ordering::Relaxed),
            failure_count: self.failure_count.load(Ordering::Relaxed),
            avg_latency_us,
            p50_latency_us,
            p95_latency_us,
            p99_latency_us,
        }
    }
}

/// Thread-safe metrics storage for one server.
///
/// Global counters and per-method counters are plain atomics updated with
/// relaxed ordering; a snapshot is a best-effort, eventually consistent view.
/// The method table itself sits behind an `RwLock` that is only taken for
/// writing when a method is seen for the first time.
///
/// # Example
///
/// ```rust
/// use polyrpc_metrics::MetricsRegistry;
///
/// let registry = MetricsRegistry::new();
/// registry.record_method_call("SampleService_Add", 150, true);
///
/// let snapshot = registry.snapshot();
/// assert_eq!(snapshot.total_requests, 1);
/// assert_eq!(snapshot.methods["SampleService_Add"].call_count, 1);
/// ```
#[derive(Debug)]
pub struct MetricsRegistry {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    active_connections: AtomicU64,
    methods: RwLock<HashMap<String, Arc<MethodStats>>>,
    clock: AtomicU64,
    start_time: Instant,
    config: MetricsConfig,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::with_config(MetricsConfig::default())
    }

    pub fn with_config(config: MetricsConfig) -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            active_connections: AtomicU64::new(0),
            methods: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
            start_time: Instant::now(),
            config,
        }
    }

    /// Call this when an HTTP connection is accepted.
    pub fn increment_active_connections(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Call this when an HTTP connection is closed.
    pub fn decrement_active_connections(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    /// Counts a request that failed before it could be attributed to a method.
    pub fn record_rejected(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a completed call with its latency and outcome.
    pub fn record_method_call(&self, method: &str, latency_us: u64, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }

        let now = self.clock.fetch_add(1, Ordering::Relaxed);
        self.method_stats(method, now).record(latency_us, success, now);
    }

    fn method_stats(&self, method: &str, now: u64) -> Arc<MethodStats> {
        if let Some(stats) = self
            .methods
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(method)
        {
            return stats.clone();
        }

        let mut methods = self
            .methods
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !methods.contains_key(method) && methods.len() >= self.config.max_methods {
            let oldest = methods
                .iter()
                .min_by_key(|(_, stats)| stats.last_access.load(Ordering::Relaxed))
                .map(|(name, _)| name.clone());
            if let Some(name) = oldest {
                methods.remove(&name);
            }
        }

        methods
            .entry(method.to_string())
            .or_insert_with(|| Arc::new(MethodStats::new(now)))
            .clone()
    }

    pub fn uptime_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let methods = self
            .methods
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(name, stats)| (name.clone(), stats.snapshot()))
            .collect();

        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            uptime_ms: self.uptime_ms(),
            methods,
        }
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
