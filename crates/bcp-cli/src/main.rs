// Copyright 2025 BCP Authors
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

//! # BCP CLI Entry Point
//!
//! Main binary for the BCP broadcast call proxy.
//!
//! ## Usage
//!
//! ```bash
//! # Run an echo receiver named "logger"
//! bcp serve -n logger -b 0.0.0.0:7400
//!
//! # Broadcast one value-returning call to every receiver in a roster file
//! bcp call -c receivers.json record -a '{"line": "hello"}'
//!
//! # Broadcast a oneway call with a 2 second per-receiver timeout
//! bcp call -c receivers.json flush --oneway -t 2000
//!
//! # Show which receivers are reachable
//! bcp status -c receivers.json
//! ```
//!
//! The roster file is a JSON list of `{"Name": ..., "Host": ...}` objects.

use anyhow::Result;
use argh::FromArgs;
use serde_json::json;
use std::time::Duration;

use bcp_common::protocol::{BcpError, Request};
use bcp_common::transport::TcpServer;
use bcp_proxy::{BroadcastProxy, Invocation, ProxyConfig};

#[derive(FromArgs)]
/// BCP - broadcast call proxy
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Serve(ServeArgs),
    Call(CallArgs),
    Status(StatusArgs),
}

/// Arguments for running a receiver.
///
/// The receiver answers the proxy handshake for its name and echoes the
/// arguments of every call back to the caller.
#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
/// run an echo receiver
struct ServeArgs {
    /// name this receiver answers to
    #[argh(option, short = 'n')]
    name: String,

    /// address to bind to
    ///
    /// Defaults to "0.0.0.0:7400".
    #[argh(option, short = 'b', default = "\"0.0.0.0:7400\".into()")]
    bind: String,
}

/// Arguments for a single broadcast call.
#[derive(FromArgs)]
#[argh(subcommand, name = "call")]
/// broadcast one call and print the outcome as JSON
struct CallArgs {
    /// path to the JSON roster file
    #[argh(option, short = 'c', long = "config")]
    config: String,

    /// method to invoke on every receiver
    #[argh(positional)]
    method: String,

    /// JSON arguments
    #[argh(option, short = 'a', long = "args", default = "\"null\".into()")]
    args: String,

    /// send without waiting for return values
    #[argh(switch)]
    oneway: bool,

    /// per-receiver messaging timeout in milliseconds
    #[argh(option, short = 't', long = "timeout-ms", default = "30000")]
    timeout_ms: u64,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "status")]
/// raise connections and print the proxy status
struct StatusArgs {
    /// path to the JSON roster file
    #[argh(option, short = 'c', long = "config")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // call prints pure JSON on stdout, so it stays quiet
    if !matches!(cli.command, Commands::Call(_)) {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Call(args) => run_call(args).await,
        Commands::Status(args) => run_status(args).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let server = TcpServer::bind(&args.bind).await?;
    tracing::info!("Receiver '{}' listening on {}", args.name, server.local_addr()?);

    server
        .serve(args.name, |req: Request| async move {
            tracing::debug!(method = %req.method, oneway = req.oneway, "Call received");
            Ok::<_, BcpError>(req.args)
        })
        .await?;

    Ok(())
}

async fn run_call(args: CallArgs) -> Result<()> {
    let call_args: serde_json::Value = serde_json::from_str(&args.args)
        .map_err(|e| anyhow::anyhow!("Invalid JSON in args: {}", e))?;

    let config = ProxyConfig::default().with_messaging_timeout(Duration::from_millis(args.timeout_ms));
    let proxy = BroadcastProxy::from_config_file(&args.config, config)?;

    let invocation = if args.oneway {
        Invocation::oneway(args.method, call_args)
    } else {
        Invocation::value_returning(args.method, call_args)
    };
    let reply = proxy.forward(invocation).await;

    let output = json!({
        "outcome": reply.outcome,
        "results": reply.results,
        "stats": proxy.stats(),
    });
    println!("{}", serde_json::to_string(&output)?);

    Ok(())
}

async fn run_status(args: StatusArgs) -> Result<()> {
    let proxy = BroadcastProxy::from_config_file(&args.config, ProxyConfig::default())?;
    tracing::info!("Loaded {} receivers from {}", proxy.count(), args.config);

    proxy.raise_connections().await;
    println!("{}", proxy.status().await);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_serve() {
        let args: Cli = Cli::from_args(&["bcp"], &["serve", "-n", "logger", "-b", "127.0.0.1:9000"]).unwrap();
        match args.command {
            Commands::Serve(ServeArgs { name, bind }) => {
                assert_eq!(name, "logger");
                assert_eq!(bind, "127.0.0.1:9000");
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_parse_serve_default_bind() {
        let args: Cli = Cli::from_args(&["bcp"], &["serve", "-n", "logger"]).unwrap();
        match args.command {
            Commands::Serve(ServeArgs { bind, .. }) => {
                assert_eq!(bind, "0.0.0.0:7400");
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_parse_serve_requires_name() {
        assert!(Cli::from_args(&["bcp"], &["serve"]).is_err());
    }

    #[test]
    fn test_cli_parse_call_defaults() {
        let args: Cli = Cli::from_args(&["bcp"], &["call", "-c", "roster.json", "record"]).unwrap();
        match args.command {
            Commands::Call(CallArgs { config, method, args, oneway, timeout_ms }) => {
                assert_eq!(config, "roster.json");
                assert_eq!(method, "record");
                assert_eq!(args, "null");
                assert!(!oneway);
                assert_eq!(timeout_ms, 30000);
            }
            _ => panic!("Expected Call command"),
        }
    }

    #[test]
    fn test_cli_parse_call_oneway() {
        let args: Cli = Cli::from_args(&["bcp"], &[
            "call",
            "--config", "roster.json",
            "flush",
            "--args", r#"{"force": true}"#,
            "--oneway",
            "-t", "500",
        ]).unwrap();
        match args.command {
            Commands::Call(CallArgs { method, args, oneway, timeout_ms, .. }) => {
                assert_eq!(method, "flush");
                assert_eq!(args, r#"{"force": true}"#);
                assert!(oneway);
                assert_eq!(timeout_ms, 500);
            }
            _ => panic!("Expected Call command"),
        }
    }

    #[test]
    fn test_cli_parse_status() {
        let args: Cli = Cli::from_args(&["bcp"], &["status", "-c", "roster.json"]).unwrap();
        match args.command {
            Commands::Status(StatusArgs { config }) => assert_eq!(config, "roster.json"),
            _ => panic!("Expected Status command"),
        }
    }

    #[tokio::test]
    async fn test_run_call_rejects_bad_json() {
        let err = run_call(CallArgs {
            config: "unused.json".to_string(),
            method: "m".to_string(),
            args: "{not json".to_string(),
            oneway: false,
            timeout_ms: 100,
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Invalid JSON in args"));
    }

    #[tokio::test]
    async fn test_run_status_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_status(StatusArgs {
            config: dir.path().join("roster.json").to_string_lossy().into_owned(),
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Configuration error"));
    }
}
