// Copyright 2026 polyrpc Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # polyrpc CLI
//!
//! Command-line client for any polyrpc server. It speaks raw JSON-RPC, so it
//! needs no knowledge of the service's types: arguments are given as JSON and
//! results are printed as JSON.
//!
//! ## Key Commands
//!
//! - `polyrpc call`: Call a method (outputs raw JSON for scripting)
//! - `polyrpc info`: Show the bound service and its methods
//! - `polyrpc metrics`: Show call counters and latencies
//! - `polyrpc health`: Liveness probe

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use polyrpc_client::{ClientConfig, RpcClient};
use polyrpc_common::protocol::builtin::{HEALTH_METHOD, INFO_METHOD, METRICS_METHOD};
use serde_json::Value;

/// Validates that a URL string starts with http:// or https://
///
/// `description` names what the URL is for in the error message.
pub fn validate_http_url(url: &str, description: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow!(
            "Invalid {}: '{}' must start with http:// or https://",
            description,
            url
        ))
    }
}

/// Parses the `--params` argument.
///
/// The value is sent as the request's `params` member unchanged, so it may be
/// an array of positional arguments, an object of named arguments or a single
/// bare value. No argument means the member is omitted.
pub fn parse_params(raw: Option<&str>) -> Result<Option<Value>> {
    raw.map(|text| serde_json::from_str(text).map_err(|e| anyhow!("Invalid JSON in params: {}", e)))
        .transpose()
}

/// Built-in procedures reachable through their own subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Health,
    Info,
    Metrics,
}

impl Builtin {
    pub fn method(self) -> &'static str {
        match self {
            Builtin::Health => HEALTH_METHOD,
            Builtin::Info => INFO_METHOD,
            Builtin::Metrics => METRICS_METHOD,
        }
    }
}

/// Makes one call and returns its raw result.
///
/// RPC errors are turned into an `anyhow` error carrying the error kind, code
/// and message.
pub async fn call(server_address: &str, method: &str, params: Option<Value>, timeout: Duration) -> Result<Value> {
    validate_http_url(server_address, "server address")?;

    let config = ClientConfig::default().with_timeout(timeout);
    let client = RpcClient::connect_with_config(server_address, config)
        .with_context(|| format!("Failed to create client for {}", server_address))?;

    tracing::debug!("Calling {} on {}", method, server_address);
    let result = client.call_raw(method, params).await?;
    Ok(result)
}

pub async fn call_builtin(server_address: &str, builtin: Builtin, timeout: Duration) -> Result<Value> {
    call(server_address, builtin.method(), None, timeout).await
}

/// Renders a result for stdout: compact by default so it pipes into tools
/// like `jq`, indented with `pretty`.
pub fn render(value: &Value, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

#[cfg(test)]
mod tests;
