//! Majority vote over independently obtained outcomes.
//!
//! # Rules
//! 1. Failures are discarded.
//! 2. Surviving payloads are grouped by canonical encoding.
//! 3. No payload at all → `NoResponses`.
//! 4. One distinct payload → trusted, whatever its count.
//! 5. Otherwise the most frequent payload wins only if its count is strictly
//!    greater than the runner-up's; a tie at the top is `AmbiguousConsensus`.
//!
//! The verdict depends only on the multiset of payloads, never on the
//! order outcomes arrive in.

use std::collections::HashMap;

use crate::fetch::{FetchError, FetchOutcome, Payload};
use crate::consensus::canonical::canonical_bytes;

/// One distinct answer and how many paths produced it.
#[derive(Debug, Clone)]
pub struct TallyEntry {
    pub count: usize,
    pub representative: Payload,
}

/// Occurrence counts for one consensus round.
#[derive(Debug, Default)]
pub struct ConsensusTally {
    entries: HashMap<Vec<u8>, TallyEntry>,
    failed: usize,
}

impl ConsensusTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one outcome.
    pub fn record(&mut self, outcome: FetchOutcome) {
        match outcome {
            Ok(payload) => {
                let key = canonical_bytes(&payload);
                self.entries
                    .entry(key)
                    .and_modify(|e| e.count += 1)
                    .or_insert(TallyEntry { count: 1, representative: payload });
            }
            Err(_) => self.failed += 1,
        }
    }

    /// Number of successful outcomes recorded.
    pub fn responded(&self) -> usize {
        self.entries.values().map(|e| e.count).sum()
    }

    /// Number of failed outcomes recorded.
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Number of distinct payloads recorded.
    pub fn distinct(&self) -> usize {
        self.entries.len()
    }

    /// Consume the tally and return the trusted payload, if any.
    pub fn decide(self) -> FetchOutcome {
        let distinct = self.entries.len();
        let mut groups: Vec<TallyEntry> = self.entries.into_values().collect();

        match groups.len() {
            0 => Err(FetchError::NoResponses),
            1 => Ok(groups.swap_remove(0).representative),
            _ => {
                groups.sort_unstable_by(|a, b| b.count.cmp(&a.count));
                let top_count = groups[0].count;
                if groups[1].count == top_count {
                    Err(FetchError::AmbiguousConsensus { top_count, distinct })
                } else {
                    Ok(groups.swap_remove(0).representative)
                }
            }
        }
    }
}

impl FromIterator<FetchOutcome> for ConsensusTally {
    fn from_iter<I: IntoIterator<Item = FetchOutcome>>(iter: I) -> Self {
        let mut tally = ConsensusTally::new();
        for outcome in iter {
            tally.record(outcome);
        }
        tally
    }
}

/// Decide the trusted payload among `outcomes`.
///
/// Disagreement between paths is logged at warn, whatever the verdict.
pub fn resolve<I>(outcomes: I) -> FetchOutcome
where
    I: IntoIterator<Item = FetchOutcome>,
{
    let tally: ConsensusTally = outcomes.into_iter().collect();
    let (responded, failed, distinct) = (tally.responded(), tally.failed(), tally.distinct());
    let verdict = tally.decide();

    if distinct > 1 {
        tracing::warn!(responded, failed, distinct, trusted = verdict.is_ok(), "Paths disagree");
    } else {
        tracing::trace!(responded, failed, distinct, "Vote");
    }
    verdict
}
