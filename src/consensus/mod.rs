//! Consensus subsystem.
//!
//! # Data Flow
//! ```text
//! Outcomes from sibling paths (connections of one circuit, or circuits of one chain)
//!     → canonical.rs (deterministic payload encoding)
//!     → tally.rs (group identical answers, count them)
//!     → Trusted payload | NoResponses | AmbiguousConsensus
//! ```
//!
//! # Design Decisions
//! - One pure function serves both the intra-circuit and inter-circuit vote
//! - Strict plurality: a tie at the top is never broken by guessing
//! - Byte comparison of canonical encodings, no hashing shortcuts

pub mod canonical;
pub mod tally;

pub use tally::{resolve, ConsensusTally, TallyEntry};
