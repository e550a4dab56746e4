//! Server configuration

use polyrpc_common::PolyrpcError;

/// Default request body limit: 1 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Settings for [`HttpServer`](crate::HttpServer).
///
/// # Example
///
/// ```rust
/// use polyrpc_server::ServerConfig;
///
/// let config = ServerConfig::default()
///     .with_max_body_bytes(64 * 1024)
///     .with_keep_alive(false);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Largest request body accepted; bigger bodies are answered with a
    /// request-too-large error envelope
    pub max_body_bytes: usize,
    /// Keep HTTP/1.1 connections open between requests
    pub keep_alive: bool,
}

impl ServerConfig {
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn validate(&self) -> Result<(), PolyrpcError> {
        if self.max_body_bytes == 0 {
            return Err(PolyrpcError::InvalidConfig(
                "max_body_bytes must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            keep_alive: true,
        }
    }
}
