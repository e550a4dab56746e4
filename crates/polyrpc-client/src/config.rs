//! Client configuration

use std::time::Duration;

use polyrpc_common::PolyrpcError;

/// Default per-call timeout: 30 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default response body limit: 16 MiB.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

/// Settings for [`HttpTransport`](crate::HttpTransport).
///
/// # Example
///
/// ```rust
/// use polyrpc_client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default().with_timeout(Duration::from_secs(5));
/// assert!(config.validate().is_ok());
/// assert!(ClientConfig::default().with_timeout(Duration::ZERO).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Upper bound on one call, from sending the request to reading the whole
    /// response; exceeding it is a transport error
    pub timeout: Duration,
    /// Largest response body accepted
    pub max_response_bytes: usize,
}

impl ClientConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_response_bytes(mut self, max_response_bytes: usize) -> Self {
        self.max_response_bytes = max_response_bytes;
        self
    }

    pub fn validate(&self) -> Result<(), PolyrpcError> {
        if self.timeout.is_zero() {
            return Err(PolyrpcError::InvalidConfig(
                "timeout must be greater than 0".to_string(),
            ));
        }
        if self.max_response_bytes == 0 {
            return Err(PolyrpcError::InvalidConfig(
                "max_response_bytes must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}
