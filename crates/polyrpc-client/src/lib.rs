//! polyrpc Client
//!
//! [`RpcClient`] turns method calls into request envelopes and sends them
//! over a [`Transport`](polyrpc_common::Transport), by default the pooled
//! [`HttpTransport`]. Generated service stubs are thin wrappers over it.

pub mod client;
pub mod config;
pub mod http;

pub use client::RpcClient;
pub use config::ClientConfig;
pub use http::HttpTransport;
