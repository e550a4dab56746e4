//! # polyrpc CLI Entry Point
//!
//! Talks to any polyrpc server from the command line.
//!
//! ## Usage
//!
//! ```bash
//! # Call a method with positional arguments (outputs raw JSON)
//! polyrpc call http://127.0.0.1:9009 SampleService_Add -p '[2, 3]'
//!
//! # Call a method with named arguments
//! polyrpc call http://127.0.0.1:9009 SampleService_Add -p '{"a": 2, "b": 3}'
//!
//! # Inspect a server
//! polyrpc info http://127.0.0.1:9009
//! polyrpc metrics --pretty http://127.0.0.1:9009
//! polyrpc health http://127.0.0.1:9009
//! ```
//!
//! All URLs must include the `http://` or `https://` prefix. Logs go to
//! stderr and are controlled by `RUST_LOG`.

use std::time::Duration;

use anyhow::Result;
use argh::FromArgs;
use polyrpc_cli::{call, call_builtin, parse_params, render, Builtin};

#[derive(FromArgs)]
/// polyrpc - call JSON-RPC services over HTTP
struct Cli {
    /// per-call timeout in milliseconds
    #[argh(option, long = "timeout-ms", default = "30000")]
    timeout_ms: u64,

    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Call(CallArgs),
    Info(InfoArgs),
    Metrics(MetricsArgs),
    Health(HealthArgs),
}

/// Arguments for making a single RPC call.
///
/// The result is written to stdout as JSON; an RPC error is reported on
/// stderr with a non-zero exit code.
#[derive(FromArgs)]
#[argh(subcommand, name = "call")]
/// call an RPC method on a server
struct CallArgs {
    /// address of the server to call, e.g. http://127.0.0.1:9009
    #[argh(positional)]
    server_address: String,

    /// qualified method name, e.g. SampleService_Add
    #[argh(positional)]
    method: String,

    /// JSON params: an array of positional arguments, an object of named
    /// arguments or a single value; omitted for methods without arguments
    #[argh(option, short = 'p', long = "params")]
    params: Option<String>,

    /// indent the JSON output
    #[argh(switch)]
    pretty: bool,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "info")]
/// show the service bound to a server and its methods
struct InfoArgs {
    /// address of the server
    #[argh(positional)]
    server_address: String,

    /// indent the JSON output
    #[argh(switch)]
    pretty: bool,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "metrics")]
/// show call counters and latencies of a server
struct MetricsArgs {
    /// address of the server
    #[argh(positional)]
    server_address: String,

    /// indent the JSON output
    #[argh(switch)]
    pretty: bool,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "health")]
/// check that a server is answering
struct HealthArgs {
    /// address of the server
    #[argh(positional)]
    server_address: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // stdout carries the JSON result, so logs go to stderr
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let timeout = Duration::from_millis(cli.timeout_ms);
    let (result, pretty) = match cli.command {
        Commands::Call(args) => {
            let params = parse_params(args.params.as_deref())?;
            (call(&args.server_address, &args.method, params, timeout).await?, args.pretty)
        }
        Commands::Info(args) => (
            call_builtin(&args.server_address, Builtin::Info, timeout).await?,
            args.pretty,
        ),
        Commands::Metrics(args) => (
            call_builtin(&args.server_address, Builtin::Metrics, timeout).await?,
            args.pretty,
        ),
        Commands::Health(args) => (
            call_builtin(&args.server_address, Builtin::Health, timeout).await?,
            false,
        ),
    };

    println!("{}", render(&result, pretty)?);
    Ok(())
}
