//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Exchange on one connection:
//!     → timeouts.rs (min of caller timeout and ceiling)
//!
//! Point read (no consensus):
//!     → exclusion.rs (random candidate, exclude on transient failure,
//!       abort on fatal failure, aggregate when the budget runs out)
//!
//! Caller-side re-fetch of a whole consensus fetch:
//!     → backoff.rs (exponential delay with jitter between rounds)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every exchange has a deadline
//! - Retries never revisit a candidate within one call
//! - The consensus fetch itself never retries; re-fetching is opt-in

pub mod backoff;
pub mod exclusion;
pub mod timeouts;

pub use exclusion::{CandidateSource, RetryBounds};
