//! HTTP transport
//!
//! POSTs each request envelope to the endpoint URL over a pooled hyper client.
//! Connections are kept alive and reused across calls; the pool is internally
//! synchronized, so one transport serves any number of concurrent calls.
//!
//! Only plain `http://` connections are made. An `https://` endpoint passes
//! validation but every call on it fails with a transport error.

use futures::future::BoxFuture;
use futures::FutureExt;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use polyrpc_common::transport::http::JSON_CONTENT_TYPE;
use polyrpc_common::{PolyrpcError, Result, RpcError, Transport};

use crate::config::ClientConfig;

/// Checks that `url` is an absolute `http://` or `https://` URL with a host.
///
/// ```
/// use polyrpc_client::http::validate_endpoint;
///
/// assert!(validate_endpoint("http://127.0.0.1:9009").is_ok());
/// assert!(validate_endpoint("127.0.0.1:9009").is_err());
/// ```
pub fn validate_endpoint(url: &str) -> Result<Uri> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(PolyrpcError::InvalidEndpoint(format!(
            "'{}' must start with http:// or https://",
            url
        )));
    }

    let uri: Uri = url
        .parse()
        .map_err(|e| PolyrpcError::InvalidEndpoint(format!("'{}': {}", url, e)))?;

    if uri.host().map_or(true, str::is_empty) {
        return Err(PolyrpcError::InvalidEndpoint(format!("'{}' has no host", url)));
    }

    Ok(uri)
}

/// HTTP/1.1 transport to one endpoint.
#[derive(Clone)]
pub struct HttpTransport {
    endpoint: Uri,
    client: Client<HttpConnector, Full<Bytes>>,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_config(endpoint, ClientConfig::default())
    }

    pub fn with_config(endpoint: &str, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let endpoint = validate_endpoint(endpoint)?;
        let client = Client::builder(TokioExecutor::new()).build_http();

        Ok(Self {
            endpoint,
            client,
            config,
        })
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn post(&self, body: Vec<u8>) -> std::result::Result<Vec<u8>, RpcError> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| RpcError::transport(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| RpcError::transport(format!("HTTP request to {} failed: {}", self.endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::transport(format!(
                "{} answered with HTTP {}",
                self.endpoint, status
            )));
        }

        let limit = self.config.max_response_bytes;
        match Limited::new(response.into_body(), limit).collect().await {
            Ok(collected) => Ok(collected.to_bytes().to_vec()),
            Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => Err(RpcError::transport(
                format!("response from {} exceeds {} bytes", self.endpoint, limit),
            )),
            Err(err) => Err(RpcError::transport(format!(
                "Failed to read response from {}: {}",
                self.endpoint, err
            ))),
        }
    }
}

impl Transport for HttpTransport {
    fn round_trip(&self, body: Vec<u8>) -> BoxFuture<'_, std::result::Result<Vec<u8>, RpcError>> {
        async move {
            let timeout = self.config.timeout;
            tokio::time::timeout(timeout, self.post(body))
                .await
                .map_err(|_| {
                    RpcError::transport(format!(
                        "call to {} timed out after {}ms",
                        self.endpoint,
                        timeout.as_millis()
                    ))
                })?
        }
        .boxed()
    }

    fn describe(&self) -> String {
        self.endpoint.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyrpc_common::ErrorKind;
    use std::time::Duration;

    #[test]
    fn test_endpoint_validation() {
        assert!(validate_endpoint("http://127.0.0.1:9009").is_ok());
        assert!(validate_endpoint("https://example.com/rpc").is_ok());
        assert!(matches!(
            validate_endpoint("127.0.0.1:9009"),
            Err(PolyrpcError::InvalidEndpoint(_))
        ));
        assert!(validate_endpoint("ftp://127.0.0.1").is_err());
        assert!(validate_endpoint("http://").is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ClientConfig::default().with_max_response_bytes(0);
        assert!(matches!(
            HttpTransport::with_config("http://127.0.0.1:9009", config),
            Err(PolyrpcError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::with_config(
            &format!("http://{}", addr),
            ClientConfig::default().with_timeout(Duration::from_secs(5)),
        )
        .unwrap();
        let err = transport.round_trip(b"{}".to_vec()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportError);
    }
}
