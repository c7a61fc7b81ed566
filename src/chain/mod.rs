//! Typed chain reads.
//!
//! # Data Flow
//! ```text
//! ChainReader::balance(address)
//!     → RpcRequest (eth_getBalance)
//!     → Fetcher::fetch (consensus) or Fetcher::point_read (nonce)
//!     → hex quantity → alloy primitive
//! ```

pub mod reader;
pub mod types;

pub use reader::ChainReader;
pub use types::{ChainId, ReadError, ReadResult};
