//! Service Contract
//!
//! A service is a named set of operations. Each operation has a fixed list of
//! named parameters, a return shape and may fail with an
//! [`RpcError`](crate::RpcError). On the wire it is addressed by its qualified
//! name, `<Service>_<Operation>`.
//!
//! Concrete services are declared with `rpc_service!` from the `polyrpc`
//! crate, which generates the trait implementers fill in, a client stub and a
//! [`Dispatch`] adapter. This module holds what the server needs to drive any
//! such adapter without knowing the service's types.

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;

use crate::protocol::error::RpcError;

/// Static description of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MethodInfo {
    /// Qualified wire name, e.g. `SampleService_Add`
    pub name: &'static str,
    /// Parameter names in declaration order
    pub params: &'static [&'static str],
    /// Rust return type as written in the declaration
    pub returns: &'static str,
}

impl MethodInfo {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Builds the qualified wire name of an operation.
///
/// ```
/// assert_eq!(polyrpc_common::service::qualified_name("SampleService", "Add"), "SampleService_Add");
/// ```
pub fn qualified_name(service: &str, operation: &str) -> String {
    format!("{}_{}", service, operation)
}

/// A service implementation bound behind a type-erased, JSON-facing interface.
///
/// `dispatch` decodes the arguments, runs the operation and encodes its result.
/// Unknown method names fail with a method-not-found error and argument
/// mismatches with an invalid-params error; both happen before any user code
/// runs.
///
/// The returned future is `'static` so the server can move it onto its own
/// task; implementations clone whatever shared handle they need into it.
pub trait Dispatch: Send + Sync + 'static {
    /// Name of the service, e.g. `SampleService`
    fn service_name(&self) -> &'static str;

    /// Every operation the service exposes.
    fn methods(&self) -> &'static [MethodInfo];

    /// Invokes `method` with the raw `params` member of a request.
    fn dispatch(&self, method: &str, params: Option<Value>) -> BoxFuture<'static, Result<Value, RpcError>>;

    /// Looks up an operation by its qualified name.
    fn method(&self, name: &str) -> Option<&'static MethodInfo> {
        self.methods().iter().find(|m| m.name == name)
    }
}
