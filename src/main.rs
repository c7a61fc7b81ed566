//! relay-fetch: one-shot reads through the consensus fetch engine.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────────┐
//!                        │                   FETCH ENGINE                        │
//!                        │                                                       │
//!   RpcRequest ──────────┼─▶ Fetcher ──▶ CircuitDirectory[chain] ──┐             │
//!                        │                                          │             │
//!                        │          ┌───────────────────────────────┴──────┐      │
//!                        │          ▼                                      ▼      │
//!                        │   circuit A: send × N              circuit B: send × M │
//!                        │          │ (url / stream)                       │      │
//!                        │          ▼                                      ▼      │
//!                        │   intra-circuit vote                 intra-circuit vote│
//!                        │          └──────────────┬───────────────────────┘      │
//!                        │                         ▼                              │
//!   payload | error ◀────┼──────────── inter-circuit vote                         │
//!                        │                                                       │
//!                        │  cross-cutting: config · observability · lifecycle   │
//!                        └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use serde_json::Value;

use relay_consensus::chain::ChainReader;
use relay_consensus::config::load_config;
use relay_consensus::fetch::{Fetcher, RpcRequest};
use relay_consensus::lifecycle::Session;
use relay_consensus::observability::{logging, metrics};
use relay_consensus::resilience::backoff::RefetchPolicy;

#[derive(Parser)]
#[command(name = "relay-fetch")]
#[command(about = "Fetch chain data with cross-circuit consensus", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "relay.toml")]
    config: PathBuf,

    /// Per-exchange timeout in milliseconds (capped by the configured ceiling).
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Consensus fetch of an arbitrary JSON-RPC method
    Call {
        chain: u64,
        method: String,
        /// Positional params as a JSON array
        #[arg(default_value = "[]")]
        params: String,
    },
    /// Single-path read of an arbitrary JSON-RPC method
    Point {
        chain: u64,
        method: String,
        #[arg(default_value = "[]")]
        params: String,
    },
    /// Latest block number
    BlockNumber { chain: u64 },
    /// Balance of an address, in wei
    Balance { chain: u64, address: Address },
    /// Pending nonce of an address
    Nonce { chain: u64, address: Address },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init_logging(&config.observability)?;
    tracing::info!(config = %cli.config.display(), chains = config.chains.len(), "relay-fetch starting");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let session = Arc::new(Session::connect(&config).await?);
    let fetcher = Arc::new(Fetcher::from_config(session.clone(), &config.fetch));
    let timeout = cli.timeout_ms.map(Duration::from_millis);
    let policy = RefetchPolicy::from(&config.refetch);

    let result: Result<Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Call { chain, method, params } => {
            let request = RpcRequest::new(chain, method, parse_params(&params)?);
            fetcher
                .fetch_with_refetch(&request, timeout, &policy)
                .await
                .map_err(Into::into)
        }
        Commands::Point { chain, method, params } => {
            let request = RpcRequest::new(chain, method, parse_params(&params)?);
            fetcher.point_read(&request, timeout).await.map_err(Into::into)
        }
        Commands::BlockNumber { chain } => reader(&fetcher, chain, timeout)
            .block_number()
            .await
            .map(Value::from)
            .map_err(Into::into),
        Commands::Balance { chain, address } => reader(&fetcher, chain, timeout)
            .balance(address)
            .await
            .map(|wei| Value::String(wei.to_string()))
            .map_err(Into::into),
        Commands::Nonce { chain, address } => reader(&fetcher, chain, timeout)
            .transaction_count(address)
            .await
            .map(Value::from)
            .map_err(Into::into),
    };

    drop(fetcher);
    match Arc::try_unwrap(session) {
        Ok(session) => session.close().await,
        Err(_) => tracing::warn!("Session still shared at exit"),
    }

    let value = result?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn reader(fetcher: &Arc<Fetcher>, chain: u64, timeout: Option<Duration>) -> ChainReader {
    let reader = ChainReader::new(fetcher.clone(), chain);
    match timeout {
        Some(timeout) => reader.with_timeout(timeout),
        None => reader,
    }
}

fn parse_params(raw: &str) -> Result<Vec<Value>, Box<dyn std::error::Error>> {
    match serde_json::from_str(raw)? {
        Value::Array(params) => Ok(params),
        other => Err(format!("params must be a JSON array, got {}", other).into()),
    }
}
