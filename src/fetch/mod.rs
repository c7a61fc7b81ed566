//! Fetch orchestration subsystem.
//!
//! # Data Flow
//! ```text
//! Fetcher::fetch(request)
//!     → session directory lookup by chain id
//!     → every circuit, concurrently:
//!         → every connection, concurrently: Transport::send
//!         → consensus::resolve (intra-circuit)
//!     → consensus::resolve (inter-circuit)
//!     → trusted payload | FetchError
//!
//! Fetcher::point_read(request)
//!     → resilience::exclusion (random candidate, no repeats)
//!     → first successful payload | FetchError
//! ```
//!
//! # Design Decisions
//! - Fan-out is a join over futures owned by the call; nothing is spawned
//! - Fatal verdicts are returned verbatim; re-fetching is the caller's choice

pub mod error;
pub mod orchestrator;
pub mod types;

pub use error::{FailureCategory, FailureKind, FetchError};
pub use orchestrator::{FetchSettings, Fetcher};
pub use types::{FetchOutcome, Payload, RequestKey, RpcRequest};
