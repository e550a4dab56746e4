pub mod builtin;
pub mod error;
pub mod jsonrpc;

#[cfg(test)]
mod tests;

pub use builtin::{HealthResponse, InfoResponse};
pub use error::{ErrorKind, PolyrpcError, Result, RpcError};
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
