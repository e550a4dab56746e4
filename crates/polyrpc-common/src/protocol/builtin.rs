//! Built-in procedure names and response types
//!
//! Every polyrpc server answers these methods itself, before the bound service
//! is consulted. Service method names are always `<Service>_<Operation>`, so the
//! leading underscore keeps the two namespaces apart.

use serde::{Deserialize, Serialize};

use crate::service::MethodInfo;

/// Liveness probe
pub const HEALTH_METHOD: &str = "_health";
/// Service description and uptime
pub const INFO_METHOD: &str = "_info";
/// Call counters and latencies
pub const METRICS_METHOD: &str = "_metrics";

/// Returns true for names reserved by the framework.
pub fn is_builtin(method: &str) -> bool {
    matches!(method, HEALTH_METHOD | INFO_METHOD | METRICS_METHOD)
}

/// Health check response returned by the `_health` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// Always "healthy" when the endpoint responds
    pub status: String,
}

impl HealthResponse {
    /// Creates a new healthy response.
    ///
    /// ```rust
    /// use polyrpc_common::protocol::builtin::HealthResponse;
    ///
    /// let response = HealthResponse::healthy();
    /// assert_eq!(response.status, "healthy");
    /// ```
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

/// Response of the `_info` endpoint.
///
/// Only ever produced by servers; clients read it as plain JSON.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InfoResponse {
    /// Name of the bound service
    pub service: String,
    /// polyrpc version the server was built with
    pub version: String,
    /// Milliseconds since the server started
    pub uptime_ms: u64,
    /// Operations the service exposes
    pub methods: &'static [MethodInfo],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        assert!(is_builtin("_health"));
        assert!(is_builtin("_info"));
        assert!(is_builtin("_metrics"));
        assert!(!is_builtin("SampleService_Add"));
        assert!(!is_builtin("_other"));
    }

    #[test]
    fn test_health_serialization() {
        let body = serde_json::to_string(&HealthResponse::healthy()).unwrap();
        assert_eq!(body, r#"{"status":"healthy"}"#);
    }
}
