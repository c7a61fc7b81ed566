//! Typed reads of chain state on top of the fetch engine.
//!
//! # Responsibilities
//! - Build the JSON-RPC request for each read
//! - Pick consensus or point read per operation
//! - Decode hex quantities into `alloy` primitives

use alloy::primitives::{Address, U256};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::chain::types::{ChainId, ReadError, ReadResult};
use crate::fetch::{Fetcher, RpcRequest};
use crate::transport::{RelayTransport, Transport};

/// Reads state of one chain through a shared [`Fetcher`].
#[derive(Debug)]
pub struct ChainReader<T: Transport = RelayTransport> {
    fetcher: Arc<Fetcher<T>>,
    chain_id: ChainId,
    timeout: Option<Duration>,
}

impl<T: Transport> Clone for ChainReader<T> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            chain_id: self.chain_id,
            timeout: self.timeout,
        }
    }
}

impl<T: Transport> ChainReader<T> {
    pub fn new(fetcher: Arc<Fetcher<T>>, chain_id: impl Into<ChainId>) -> Self {
        Self {
            fetcher,
            chain_id: chain_id.into(),
            timeout: None,
        }
    }

    /// Per-exchange timeout for every read; the fetcher default otherwise.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn configured_chain(&self) -> ChainId {
        self.chain_id
    }

    /// Latest block number, agreed by consensus.
    pub async fn block_number(&self) -> ReadResult<u64> {
        let payload = self.consensus("eth_blockNumber", vec![]).await?;
        parse_u64(&payload)
    }

    /// Chain id reported by the network, agreed by consensus.
    pub async fn chain_id(&self) -> ReadResult<ChainId> {
        let payload = self.consensus("eth_chainId", vec![]).await?;
        parse_u64(&payload).map(ChainId)
    }

    /// Check that the network serves the chain this reader was built for.
    pub async fn verify_chain_id(&self) -> ReadResult<()> {
        let actual = self.chain_id().await?;
        if actual != self.chain_id {
            tracing::warn!(expected = %self.chain_id, actual = %actual, "Chain id mismatch");
            return Err(ReadError::ChainMismatch {
                expected: self.chain_id.0,
                actual: actual.0,
            });
        }
        Ok(())
    }

    /// Balance of `address` at the latest block, agreed by consensus.
    pub async fn balance(&self, address: Address) -> ReadResult<U256> {
        let payload = self
            .consensus("eth_getBalance", vec![json!(address), json!("latest")])
            .await?;
        parse_u256(&payload)
    }

    /// Pending transaction count (nonce) of `address`.
    ///
    /// Served by a single path; a stale nonce is caught on submission.
    pub async fn transaction_count(&self, address: Address) -> ReadResult<u64> {
        let request = RpcRequest::new(
            self.chain_id,
            "eth_getTransactionCount",
            vec![json!(address), json!("pending")],
        );
        let payload = self.fetcher.point_read(&request, self.timeout).await?;
        parse_u64(&payload)
    }

    async fn consensus(&self, method: &str, params: Vec<Value>) -> ReadResult<Value> {
        let request = RpcRequest::new(self.chain_id, method, params);
        Ok(self.fetcher.fetch(&request, self.timeout).await?)
    }
}

fn hex_digits(payload: &Value) -> ReadResult<&str> {
    let s = payload
        .as_str()
        .ok_or_else(|| ReadError::Decode(format!("expected hex string, got {}", payload)))?;
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| ReadError::Decode(format!("missing 0x prefix: {}", s)))?;
    if digits.is_empty() {
        return Err(ReadError::Decode("empty hex quantity".into()));
    }
    Ok(digits)
}

/// Decode a JSON-RPC hex quantity into `u64`.
pub fn parse_u64(payload: &Value) -> ReadResult<u64> {
    let digits = hex_digits(payload)?;
    u64::from_str_radix(digits, 16).map_err(|e| ReadError::Decode(format!("{}: {}", digits, e)))
}

/// Decode a JSON-RPC hex quantity into `U256`.
pub fn parse_u256(payload: &Value) -> ReadResult<U256> {
    let digits = hex_digits(payload)?;
    U256::from_str_radix(digits, 16).map_err(|e| ReadError::Decode(format!("{}: {}", digits, e)))
}
