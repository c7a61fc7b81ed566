//! Consensus fetch engine for reads routed over independent relay circuits.
//!
//! Every trust-sensitive read is sent over every connection of every circuit
//! serving the request's chain. Each circuit agrees on a payload by majority
//! vote, then the circuits vote again. Only a payload that wins both rounds
//! is returned.

pub mod chain;
pub mod circuit;
pub mod config;
pub mod consensus;
pub mod fetch;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod transport;

pub use chain::{ChainId, ChainReader};
pub use config::FetcherConfig;
pub use fetch::{FetchError, FetchOutcome, Fetcher, RpcRequest};
pub use lifecycle::Session;
pub use transport::{RelayTransport, Transport};
