//! Timeout enforcement.
//!
//! # Design Decisions
//! - Every exchange has a deadline
//! - The ceiling wins over any longer caller-supplied timeout

use std::time::Duration;

/// Default hard ceiling for a single exchange.
pub const DEFAULT_TIMEOUT_CEILING: Duration = Duration::from_secs(10);

/// The timeout actually applied to one exchange.
pub fn effective_timeout(requested: Duration, ceiling: Duration) -> Duration {
    requested.min(ceiling)
}
