//! Failure taxonomy surfaced by the fetch engine.
//!
//! # Design Decisions
//! - Two kinds only: `Transient` (try another candidate) and `Fatal` (abort this call)
//! - Callers get a coarse category, never a circuit or connection identity
//! - Consensus failures are always fatal; no partial answer is ever returned

use thiserror::Error;

use crate::chain::ChainId;
use crate::transport::TransportError;

/// Retry classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Safe to retry on a different candidate within the same call.
    Transient,
    /// Abort the current call; the caller decides whether to try again later.
    Fatal,
}

/// What the caller should make of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    /// Paths were unavailable; the whole fetch may succeed later.
    RetryLater,
    /// The session has no circuits for the requested network.
    Configuration,
    /// Paths answered but disagreed irreconcilably.
    Disagreement,
    /// The caller cancelled the fetch.
    Cancelled,
}

/// Errors produced by the fetch engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// A single exchange failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The session has no circuit directory entry for this chain.
    #[error("No circuits configured for chain {chain_id}")]
    NoCircuits { chain_id: ChainId },

    /// Every candidate at one consensus level failed.
    #[error("No path returned a response")]
    NoResponses,

    /// The two most common answers were produced equally often.
    #[error("Ambiguous consensus: top answers tied at {top_count} among {distinct} distinct payloads")]
    AmbiguousConsensus { top_count: usize, distinct: usize },

    /// The candidate source ran dry before an attempt succeeded.
    ///
    /// `errors` holds each attempt's failure in attempt order; it is empty
    /// when the source was too small to start.
    #[error("Candidates exhausted after {} attempts: {}", .errors.len(), join_errors(.errors))]
    CandidatesExhausted { errors: Vec<FetchError> },

    /// Every allowed attempt failed transiently.
    #[error("All {} attempts failed: {}", .errors.len(), join_errors(.errors))]
    AggregateFailure { errors: Vec<FetchError> },

    /// The fetch was cancelled before a verdict was reached.
    #[error("Fetch cancelled")]
    Cancelled,
}

fn join_errors(errors: &[FetchError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl FetchError {
    /// Retry classification used by the exclusion loop.
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Transport(e) if e.is_transient() => FailureKind::Transient,
            _ => FailureKind::Fatal,
        }
    }

    /// Coarse classification for callers outside the engine.
    pub fn category(&self) -> FailureCategory {
        match self {
            FetchError::NoCircuits { .. } => FailureCategory::Configuration,
            FetchError::AmbiguousConsensus { .. } => FailureCategory::Disagreement,
            FetchError::Cancelled | FetchError::Transport(TransportError::Cancelled) => {
                FailureCategory::Cancelled
            }
            FetchError::Transport(_)
            | FetchError::NoResponses
            | FetchError::CandidatesExhausted { .. }
            | FetchError::AggregateFailure { .. } => FailureCategory::RetryLater,
        }
    }

    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::NoCircuits { .. } => "no_circuits",
            FetchError::NoResponses => "no_responses",
            FetchError::AmbiguousConsensus { .. } => "ambiguous",
            FetchError::CandidatesExhausted { .. } => "exhausted",
            FetchError::AggregateFailure { .. } => "aggregate",
            FetchError::Cancelled => "cancelled",
        }
    }
}
