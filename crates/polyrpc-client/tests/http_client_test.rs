//! HTTP Client Integration Tests
//!
//! These tests run `RpcClient` against small hand-written hyper servers so each
//! failure mode of a peer can be staged exactly:
//! - Successful calls and concurrent calls over one client
//! - Error objects, non-2xx statuses, malformed bodies and mismatched ids
//! - Unreachable endpoints and timeouts
//!
//! Test URLs use `127.0.0.1` with an ephemeral port.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use polyrpc_client::{ClientConfig, RpcClient};
use polyrpc_common::{ErrorKind, JsonRpcRequest, JsonRpcResponse, RpcError};
use serde_json::{json, Value};
use tokio::net::TcpListener;

type Reply = Response<Full<Bytes>>;

/// Test JSON-RPC server that runs on a separate task
struct TestJsonRpcServer {
    addr: String,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestJsonRpcServer {
    /// Starts a server that echoes the params back as the result
    async fn echo() -> Self {
        Self::with_handler(|request| async move {
            let params = request.params.clone().unwrap_or(Value::Null);
            json_reply(&JsonRpcResponse::success(request.id, params))
        })
        .await
    }

    /// Starts a server on a random port answering every request with `handler`
    async fn with_handler<F, Fut>(handler: F) -> Self
    where
        F: Fn(JsonRpcRequest) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Reply> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        let Ok((stream, _)) = result else { continue };
                        let io = TokioIo::new(stream);
                        let handler = handler.clone();

                        tokio::spawn(async move {
                            let service = service_fn(move |req: Request<Incoming>| {
                                let handler = handler.clone();
                                async move {
                                    let body = req.into_body().collect().await?.to_bytes();
                                    let request: JsonRpcRequest = serde_json::from_slice(&body).unwrap();
                                    Ok::<_, hyper::Error>(handler(request).await)
                                }
                            });

                            let _ = http1::Builder::new().serve_connection(io, service).await;
                        });
                    }
                    _ = &mut shutdown_rx => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestJsonRpcServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn json_reply(response: &JsonRpcResponse) -> Reply {
    raw_reply(StatusCode::OK, serde_json::to_vec(response).unwrap())
}

fn raw_reply(status: StatusCode, body: impl Into<Bytes>) -> Reply {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(body.into()))
        .unwrap()
}

// ============================================================================
// Basic Functionality Tests
// ============================================================================

#[tokio::test]
async fn test_client_basic_call() {
    let server = TestJsonRpcServer::echo().await;
    let client = RpcClient::connect(&server.base_url()).unwrap();

    let result: Vec<i64> = client.call("Echo_Pair", vec![json!(1), json!(2)]).await.unwrap();
    assert_eq!(result, vec![1, 2]);

    let result: String = client.call("Echo_One", vec![json!("hello")]).await.unwrap();
    assert_eq!(result, "hello");
}

#[tokio::test]
async fn test_client_concurrent_calls() {
    let server = TestJsonRpcServer::echo().await;
    let client = RpcClient::connect(&server.base_url()).unwrap();

    let tasks = (0..10)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move { client.call::<Value>("Echo_Index", vec![json!({ "index": i })]).await })
        })
        .collect::<Vec<_>>();

    let results = futures::future::join_all(tasks).await;

    for (i, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap().unwrap(), json!({ "index": i }));
    }
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[tokio::test]
async fn test_client_handles_jsonrpc_error() {
    let server = TestJsonRpcServer::with_handler(|request| async move {
        json_reply(&JsonRpcResponse::error(
            request.id,
            RpcError::method_not_found(&request.method).to_jsonrpc(),
        ))
    })
    .await;
    let client = RpcClient::connect(&server.base_url()).unwrap();

    let err = client.call_void("Nope_Nothing", vec![]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert_eq!(err.code(), -32601);
    assert!(err.message().contains("Nope_Nothing"));
}

#[tokio::test]
async fn test_client_no_retry_on_error() {
    let call_count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&call_count);
    let server = TestJsonRpcServer::with_handler(move |_request| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move { raw_reply(StatusCode::SERVICE_UNAVAILABLE, "down") }
    })
    .await;
    let client = RpcClient::connect(&server.base_url()).unwrap();

    let err = client.call_void("Svc_Op", vec![]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportError);
    assert!(err.message().contains("503"));
    assert_eq!(call_count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_client_rejects_malformed_body() {
    let server =
        TestJsonRpcServer::with_handler(|_request| async move { raw_reply(StatusCode::OK, "not json at all") }).await;
    let client = RpcClient::connect(&server.base_url()).unwrap();

    let err = client.call_void("Svc_Op", vec![]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportError);
}

#[tokio::test]
async fn test_client_rejects_mismatched_id() {
    let server = TestJsonRpcServer::with_handler(|_request| async move {
        json_reply(&JsonRpcResponse::success(json!(-1), json!(42)))
    })
    .await;
    let client = RpcClient::connect(&server.base_url()).unwrap();

    let err = client.call::<i64>("Svc_Op", vec![]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportError);
}

#[tokio::test]
async fn test_client_unreachable_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = RpcClient::connect(&format!("http://{}", addr)).unwrap();
    let err = client.call_void("Svc_Op", vec![]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportError);
}

#[tokio::test]
async fn test_client_timeout() {
    let server = TestJsonRpcServer::with_handler(|request| async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        json_reply(&JsonRpcResponse::success(request.id, json!(true)))
    })
    .await;
    let config = ClientConfig::default().with_timeout(Duration::from_millis(200));
    let client = RpcClient::connect_with_config(&server.base_url(), config).unwrap();

    let started = std::time::Instant::now();
    let err = client.call_void("Svc_Slow", vec![]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportError);
    assert!(err.message().contains("timed out"));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_client_response_limit() {
    let server = TestJsonRpcServer::with_handler(|request| async move {
        json_reply(&JsonRpcResponse::success(request.id, json!("x".repeat(4096))))
    })
    .await;
    let config = ClientConfig::default().with_max_response_bytes(1024);
    let client = RpcClient::connect_with_config(&server.base_url(), config).unwrap();

    let err = client.call::<String>("Svc_Big", vec![]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportError);
    assert!(err.message().contains("exceeds"));
}
