//! polyrpc
//!
//! Typed RPC services spoken as JSON-RPC 2.0 over HTTP.
//!
//! A service is declared once with [`rpc_service!`]; the declaration expands
//! into the trait the server implements, a client stub implementing the same
//! trait, and a dispatcher that serves any implementation. Records passed
//! between the two sides are declared with [`rpc_record!`].
//!
//! # Example
//!
//! ```no_run
//! use polyrpc::{rpc_service, RpcError};
//!
//! rpc_service! {
//!     pub service SampleService {
//!         client: SampleServiceClient,
//!         dispatcher: SampleServiceDispatcher,
//!
//!         "Add" => fn add(a: i64, b: i64) -> i64;
//!     }
//! }
//!
//! struct Sample;
//!
//! impl SampleService for Sample {
//!     async fn add(&self, a: i64, b: i64) -> Result<i64, RpcError> {
//!         Ok(a + b)
//!     }
//! }
//!
//! # async fn run() -> polyrpc::Result<()> {
//! // Server side
//! tokio::spawn(SampleServiceDispatcher::new(Sample).into_http_server().serve(9009));
//!
//! // Client side
//! let client = SampleServiceClient::connect("http://127.0.0.1:9009")?;
//! assert_eq!(client.add(2, 3).await.ok(), Some(5));
//! # Ok(())
//! # }
//! ```

mod macros;

pub use polyrpc_client::{ClientConfig, HttpTransport, RpcClient};
pub use polyrpc_common::codec;
pub use polyrpc_common::service::qualified_name;
pub use polyrpc_common::{
    Dispatch, ErrorKind, HealthResponse, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    MethodInfo, PolyrpcError, Result, RpcError, Transport,
};
pub use polyrpc_metrics::{MethodMetrics, MetricsConfig, MetricsSnapshot};
pub use polyrpc_server::{Dispatcher, HttpServer, LocalTransport, ServerConfig};

#[doc(hidden)]
pub mod __private {
    pub use futures::future::BoxFuture;
    pub use polyrpc_common::codec;
    pub use serde_json::Value;
}
