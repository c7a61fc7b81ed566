//! Bounded retry over candidates, without repetition.
//!
//! # Responsibilities
//! - Draw candidates uniformly at random (OS RNG), never the same one twice
//! - Keep trying on transient failures, up to `max_attempts`
//! - Abort at once on a fatal failure
//! - Report every attempt's error when the budget runs out
//!
//! # Design Decisions
//! - Remaining indices are shuffled once, then popped
//! - The exclusion set is owned by one call and dropped with it
//! - Candidates sharing an identity count as the same candidate

use std::collections::HashSet;
use std::future::Future;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;

use crate::fetch::{FailureKind, FetchError};

/// Anything the loop can draw candidates from.
pub trait CandidateSource {
    type Candidate: ?Sized;

    /// Total number of candidates offered.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Candidate at `index`, for `index < len()`.
    fn get(&self, index: usize) -> Option<&Self::Candidate>;

    /// Stable identity of the candidate at `index`.
    fn identity(&self, index: usize) -> Option<u64>;
}

/// Attempt limits for one run of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBounds {
    /// The source must offer at least this many candidates.
    pub min_attempts: usize,
    /// Give up after this many failed attempts.
    pub max_attempts: usize,
}

impl RetryBounds {
    pub fn new(min_attempts: usize, max_attempts: usize) -> Self {
        Self {
            min_attempts,
            max_attempts,
        }
    }

    /// Bounds whose maximum tracks the source's full capacity.
    pub fn for_source<S: CandidateSource + ?Sized>(source: &S, min_attempts: usize) -> Self {
        Self::new(min_attempts, source.len())
    }
}

/// Try `operation` on random candidates from `source` until one succeeds.
///
/// # Errors
/// - The first `Fatal` error returned by `operation`, unchanged
/// - `CandidatesExhausted` when the source has fewer than `min_attempts`
///   candidates, or runs out before `max_attempts` is reached; it carries
///   the errors collected so far
/// - `AggregateFailure` with one entry per attempt when `max_attempts`
///   transient failures have been collected
pub async fn run<'s, S, T, F, Fut>(
    source: &'s S,
    bounds: RetryBounds,
    mut operation: F,
) -> Result<T, FetchError>
where
    S: CandidateSource + ?Sized,
    F: FnMut(&'s S::Candidate) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    if source.len() < bounds.min_attempts {
        tracing::debug!(
            offered = source.len(),
            required = bounds.min_attempts,
            "Not enough candidates to start"
        );
        return Err(FetchError::CandidatesExhausted { errors: Vec::new() });
    }

    let mut remaining: Vec<usize> = (0..source.len()).collect();
    remaining.shuffle(&mut OsRng);

    let mut excluded: HashSet<u64> = HashSet::new();
    let mut errors: Vec<FetchError> = Vec::new();

    while errors.len() < bounds.max_attempts {
        let Some((candidate, identity)) = draw(source, &mut remaining, &excluded) else {
            tracing::debug!(attempts = errors.len(), "Candidate source exhausted");
            return Err(FetchError::CandidatesExhausted { errors });
        };

        match operation(candidate).await {
            Ok(value) => return Ok(value),
            Err(e) => match e.kind() {
                FailureKind::Transient => {
                    tracing::debug!(attempt = errors.len() + 1, error = %e, "Attempt failed, excluding candidate");
                    excluded.insert(identity);
                    errors.push(e);
                }
                FailureKind::Fatal => {
                    tracing::debug!(attempt = errors.len() + 1, error = %e, "Fatal failure, aborting");
                    return Err(e);
                }
            },
        }
    }

    Err(FetchError::AggregateFailure { errors })
}

/// Pop the next candidate whose identity has not been tried yet.
fn draw<'s, S>(
    source: &'s S,
    remaining: &mut Vec<usize>,
    excluded: &HashSet<u64>,
) -> Option<(&'s S::Candidate, u64)>
where
    S: CandidateSource + ?Sized,
{
    while let Some(index) = remaining.pop() {
        let Some(identity) = source.identity(index) else {
            continue;
        };
        if excluded.contains(&identity) {
            continue;
        }
        if let Some(candidate) = source.get(index) {
            return Some((candidate, identity));
        }
    }
    None
}
