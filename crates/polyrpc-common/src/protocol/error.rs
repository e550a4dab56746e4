//! polyrpc Error Types
//!
//! Two error types live here:
//!
//! - [`RpcError`]: the one error every service operation and every client stub
//!   call fails with. It carries an [`ErrorKind`], a numeric code and a message,
//!   and travels on the wire as a JSON-RPC error object.
//! - [`PolyrpcError`]: failures while setting the framework up (binding a
//!   listener, parsing an endpoint URL). These never cross the RPC boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use super::jsonrpc::{
    JsonRpcError, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
    REQUEST_TOO_LARGE, TRANSPORT_ERROR,
};

/// Category of an [`RpcError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The request could not be decoded or named an unknown method.
    BadRequest,
    /// The server failed unexpectedly while handling an otherwise valid request.
    InternalError,
    /// The call never produced a usable response (client side only).
    TransportError,
    /// The service implementation rejected the call.
    Application,
}

impl ErrorKind {
    /// Reconstructs the kind a server meant when it sent `code`.
    ///
    /// `TransportError` is never inferred: it is created locally by clients.
    pub fn from_code(code: i32) -> Self {
        match code {
            PARSE_ERROR | INVALID_REQUEST | METHOD_NOT_FOUND | INVALID_PARAMS
            | REQUEST_TOO_LARGE => ErrorKind::BadRequest,
            INTERNAL_ERROR => ErrorKind::InternalError,
            _ => ErrorKind::Application,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::BadRequest => "bad request",
            ErrorKind::InternalError => "internal error",
            ErrorKind::TransportError => "transport error",
            ErrorKind::Application => "application error",
        };
        f.write_str(name)
    }
}

/// The remote-call error raised by service operations and client stubs.
///
/// # Example
///
/// ```
/// use polyrpc_common::{ErrorKind, RpcError};
///
/// let err = RpcError::application(1001, "person already exists");
/// assert_eq!(err.kind(), ErrorKind::Application);
/// assert_eq!(err.code(), 1001);
///
/// // What the client sees after the error crossed the wire
/// let remote = RpcError::from(err.to_jsonrpc());
/// assert_eq!(remote, err);
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} ({code}): {message}")]
pub struct RpcError {
    kind: ErrorKind,
    code: i32,
    message: String,
}

impl RpcError {
    /// Error raised by a service implementation with its own code.
    ///
    /// Any code is allowed. When the code is one the framework reserves, the
    /// wire error carries `{"kind": "Application"}` in `data` so the peer still
    /// sees an application error.
    pub fn application(code: i32, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Application,
            code,
            message: message.into(),
        }
    }

    /// Malformed JSON in a request body.
    pub fn parse_error(detail: impl fmt::Display) -> Self {
        Self::from(JsonRpcError::parse_error(&detail.to_string()))
    }

    /// Well-formed JSON that is not a request envelope.
    pub fn invalid_request(detail: impl fmt::Display) -> Self {
        Self::from(JsonRpcError::invalid_request(&detail.to_string()))
    }

    /// The bound service has no such method.
    pub fn method_not_found(method: &str) -> Self {
        Self::from(JsonRpcError::method_not_found(method))
    }

    /// Arguments do not match the method signature.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::BadRequest,
            code: INVALID_PARAMS,
            message: message.into(),
        }
    }

    /// Request body exceeded the server's limit.
    pub fn request_too_large(limit: usize) -> Self {
        Self::from(JsonRpcError::request_too_large(limit))
    }

    /// Unexpected server-side fault.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InternalError,
            code: INTERNAL_ERROR,
            message: message.into(),
        }
    }

    /// Network or protocol failure observed by the client.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::TransportError,
            code: TRANSPORT_ERROR,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Wire representation of this error.
    pub fn to_jsonrpc(&self) -> JsonRpcError {
        let data = (self.kind == ErrorKind::Application
            && ErrorKind::from_code(self.code) != ErrorKind::Application)
            .then(|| json!({ "kind": ErrorKind::Application }));

        JsonRpcError {
            code: self.code,
            message: self.message.clone(),
            data,
        }
    }
}

impl From<JsonRpcError> for RpcError {
    fn from(err: JsonRpcError) -> Self {
        let kind = match err.data.as_ref().and_then(|data| data.get("kind")) {
            Some(Value::String(kind)) if kind == "Application" => ErrorKind::Application,
            _ => ErrorKind::from_code(err.code),
        };

        Self {
            kind,
            code: err.code,
            message: err.message,
        }
    }
}

/// Framework setup errors.
#[derive(Error, Debug)]
pub enum PolyrpcError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),
}

pub type Result<T> = std::result::Result<T, PolyrpcError>;
