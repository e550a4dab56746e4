//! HTTP Server for polyrpc services
//!
//! This module provides the HTTP transport server using hyper for HTTP/1.1.
//! Request bodies are handed to a [`Dispatcher`] and its response envelope is
//! written back.
//!
//! # Architecture
//!
//! The HTTP server:
//! - Listens on a TCP socket for incoming HTTP connections
//! - Spawns a tokio task for each connection (keep-alive by default)
//! - Reads each POST body, bounded by [`ServerConfig::max_body_bytes`]
//! - Answers every request with `200 OK` and a JSON-RPC envelope, including
//!   non-POST requests and unreadable or oversized bodies
//!
//! Requests on different connections run in parallel; nothing here serializes
//! calls into the service. The request path is ignored.
//!
//! # Example
//!
//! ```no_run
//! use polyrpc_server::{Dispatcher, HttpServer};
//!
//! # async fn run(dispatcher: Dispatcher) -> polyrpc_common::Result<()> {
//! let server = HttpServer::new(dispatcher);
//! server.serve(9009).await?;
//! # Ok(())
//! # }
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Method;
use hyper_util::rt::TokioIo;
use polyrpc_common::transport::{HttpEnvelope, HyperRequest, HyperResponse};
use polyrpc_common::{PolyrpcError, Result, RpcError};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;

/// Pause after a failed accept, so a persistent error such as running out of
/// file descriptors does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// HTTP server for one bound service.
pub struct HttpServer {
    dispatcher: Dispatcher,
    config: ServerConfig,
}

impl HttpServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self::with_config(dispatcher, ServerConfig::default())
    }

    pub fn with_config(dispatcher: Dispatcher, config: ServerConfig) -> Self {
        Self { dispatcher, config }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Accepts on all interfaces at `port` until the process exits.
    ///
    /// Only returns on a setup failure such as the port being taken.
    pub async fn serve(self, port: u16) -> Result<()> {
        self.run(SocketAddr::from(([0, 0, 0, 0], port))).await
    }

    /// Binds `addr` and serves until the process exits.
    pub async fn run(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| PolyrpcError::Transport(format!("Failed to bind to {}: {}", addr, e)))?;
        self.run_with_listener(listener).await
    }

    /// Serves on an already bound listener (e.g. one bound to port 0 in tests).
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<()> {
        self.run_until(listener, std::future::pending()).await
    }

    /// Serves on `listener` until `shutdown` completes.
    ///
    /// Connections already accepted finish their in-flight requests on their
    /// own tasks.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.config.validate()?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| PolyrpcError::Transport(format!("Failed to get local address: {}", e)))?;
        tracing::info!(
            "HTTP server for {} listening on {}",
            self.dispatcher.service_name(),
            local_addr
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("HTTP server on {} shutting down", local_addr);
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => self.spawn_connection(stream, peer),
                    Err(e) => {
                        tracing::error!("Failed to accept connection: {}", e);
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let io = TokioIo::new(stream);
        let dispatcher = self.dispatcher.clone();
        let max_body_bytes = self.config.max_body_bytes;
        let keep_alive = self.config.keep_alive;

        tokio::task::spawn(async move {
            let metrics = dispatcher.metrics().clone();
            metrics.connection_opened();
            tracing::debug!("Accepted connection from {}", peer);

            let service = service_fn(move |req| {
                let dispatcher = dispatcher.clone();
                async move {
                    Ok::<_, Infallible>(Self::handle_request(&dispatcher, max_body_bytes, req).await)
                }
            });

            if let Err(err) = http1::Builder::new()
                .keep_alive(keep_alive)
                .serve_connection(io, service)
                .await
            {
                tracing::error!("Error serving connection from {}: {}", peer, err);
            }

            metrics.connection_closed();
        });
    }

    /// Handles an HTTP request. Always produces a `200 OK` envelope response.
    async fn handle_request(
        dispatcher: &Dispatcher,
        max_body_bytes: usize,
        req: HyperRequest,
    ) -> HyperResponse {
        if req.method() != Method::POST {
            tracing::warn!("Rejected {} request to {}", req.method(), req.uri());
            dispatcher.metrics().record_rejected();
            let err = RpcError::invalid_request(format!(
                "only POST requests are supported, got {}",
                req.method()
            ));
            return HttpEnvelope::to_http_error(Value::Null, &err);
        }

        let body = match Self::read_body(req, max_body_bytes).await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!("Rejected request body: {}", err);
                dispatcher.metrics().record_rejected();
                return HttpEnvelope::to_http_error(Value::Null, &err);
            }
        };

        HttpEnvelope::from_bytes(dispatcher.handle(&body).await)
    }

    async fn read_body(req: HyperRequest, max_body_bytes: usize) -> std::result::Result<Bytes, RpcError> {
        match Limited::new(req.into_body(), max_body_bytes).collect().await {
            Ok(collected) => Ok(collected.to_bytes()),
            Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
                Err(RpcError::request_too_large(max_body_bytes))
            }
            Err(err) => Err(RpcError::parse_error(format!(
                "failed to read request body: {}",
                err
            ))),
        }
    }
}
