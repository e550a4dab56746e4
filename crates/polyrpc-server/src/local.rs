//! In-process transport
//!
//! [`LocalTransport`] hands request bytes straight to a [`Dispatcher`] in the
//! same process. Client stubs built on it exercise the full encode, dispatch
//! and decode path without opening a socket, which is what tests and embedded
//! uses want.

use futures::future::BoxFuture;
use futures::FutureExt;
use polyrpc_common::{RpcError, Transport};

use crate::dispatcher::Dispatcher;

/// Transport that calls a dispatcher directly.
#[derive(Clone)]
pub struct LocalTransport {
    dispatcher: Dispatcher,
}

impl LocalTransport {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl Transport for LocalTransport {
    fn round_trip(&self, body: Vec<u8>) -> BoxFuture<'_, Result<Vec<u8>, RpcError>> {
        async move { Ok(self.dispatcher.handle(&body).await) }.boxed()
    }

    fn describe(&self) -> String {
        format!("local:{}", self.dispatcher.service_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::tests::Calc;
    use serde_json::Value;

    #[tokio::test]
    async fn test_round_trip() {
        let transport = LocalTransport::new(Dispatcher::new(Calc));
        let body = br#"{"jsonrpc":"2.0","method":"Calc_Add","params":[2,3],"id":1}"#.to_vec();

        let response = transport.round_trip(body).await.unwrap();
        let response: Value = serde_json::from_slice(&response).unwrap();
        assert_eq!(response["result"], 5);
        assert_eq!(transport.describe(), "local:Calc");
    }
}
