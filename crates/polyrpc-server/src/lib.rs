//! polyrpc Server
//!
//! This crate serves a polyrpc service: the [`Dispatcher`] routes request
//! envelopes to the bound implementation, [`HttpServer`] feeds it from HTTP,
//! and [`LocalTransport`] feeds it from an in-process client.

pub mod config;
pub mod dispatcher;
pub mod http_server;
pub mod local;

pub use config::ServerConfig;
pub use dispatcher::Dispatcher;
pub use http_server::HttpServer;
pub use local::LocalTransport;
