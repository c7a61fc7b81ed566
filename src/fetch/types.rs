//! Request and outcome types shared by the engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chain::ChainId;
use crate::consensus::canonical::canonical_bytes;
use crate::fetch::error::FetchError;

/// An opaque JSON payload returned by a node.
pub type Payload = Value;

/// Result of one exchange, or of one consensus round.
pub type FetchOutcome = Result<Payload, FetchError>;

/// An RPC request addressed to one network.
///
/// Immutable once built; the engine only ever borrows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    method: String,
    params: Vec<Value>,
    chain_id: ChainId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<u32>,
}

impl RpcRequest {
    /// Create a request for `method` with positional `params` on `chain_id`.
    pub fn new(chain_id: impl Into<ChainId>, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            params,
            chain_id: chain_id.into(),
            version: None,
        }
    }

    /// Attach a caller-defined version tag (not part of the request identity).
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn version(&self) -> Option<u32> {
        self.version
    }

    /// Identity of this request for caching purposes: (chain, method, params).
    pub fn key(&self) -> RequestKey {
        RequestKey {
            chain_id: self.chain_id,
            method: self.method.clone(),
            params: canonical_bytes(&Value::Array(self.params.clone())),
        }
    }

    /// Build the JSON-RPC 2.0 envelope sent on the wire.
    pub(crate) fn envelope(&self, id: &str) -> Value {
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": self.method,
            "params": self.params,
        })
    }
}

/// Cache identity of an [`RpcRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub chain_id: ChainId,
    pub method: String,
    /// Canonical encoding of the positional params.
    pub params: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_ignores_version_and_key_order() {
        let a = RpcRequest::new(1u64, "eth_call", vec![json!({"to": "0x01", "data": "0x"}), json!("latest")]);
        let b = RpcRequest::new(1u64, "eth_call", vec![json!({"data": "0x", "to": "0x01"}), json!("latest")])
            .with_version(7);
        assert_eq!(a.key(), b.key());
        assert_eq!(b.version(), Some(7));
    }

    #[test]
    fn test_key_differs_by_chain() {
        let a = RpcRequest::new(1u64, "eth_blockNumber", vec![]);
        let b = RpcRequest::new(10u64, "eth_blockNumber", vec![]);
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_envelope_shape() {
        let req = RpcRequest::new(1u64, "eth_getBalance", vec![json!("0xabc"), json!("latest")]);
        let env = req.envelope("42");
        assert_eq!(env["jsonrpc"], "2.0");
        assert_eq!(env["id"], "42");
        assert_eq!(env["method"], "eth_getBalance");
        assert_eq!(env["params"][1], "latest");
    }
}
