//! Chain identifiers and typed-read error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fetch::FetchError;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur while reading typed chain state.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The underlying fetch did not produce a trusted payload.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The trusted payload could not be decoded into the expected type.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The network answered with a different chain id than requested.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

/// Result type for typed chain reads.
pub type ReadResult<T> = Result<T, ReadError>;
