//! Two-level consensus fetch and single-path point reads.
//!
//! A consensus fetch asks every connection of every circuit serving the
//! request's chain. Each circuit votes over its own connections first; the
//! circuit verdicts are then voted on again. A payload is trusted only when it
//! wins both rounds.

use std::sync::Arc;
use std::time::{Duration, Instant};
use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::circuit::{CircuitPool, ConnectionPool};
use crate::config::FetchConfig;
use crate::consensus;
use crate::fetch::error::{FailureCategory, FetchError};
use crate::fetch::types::{FetchOutcome, RpcRequest};
use crate::lifecycle::Session;
use crate::observability::metrics;
use crate::resilience::backoff::RefetchPolicy;
use crate::resilience::exclusion;
use crate::resilience::RetryBounds;
use crate::transport::{RelayTransport, Transport};

/// Per-fetcher knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    /// Timeout applied when the caller passes `None`.
    pub default_timeout: Duration,
    /// Minimum candidates a point read needs before it starts.
    pub min_point_attempts: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self::from(&FetchConfig::default())
    }
}

impl From<&FetchConfig> for FetchSettings {
    fn from(config: &FetchConfig) -> Self {
        Self {
            default_timeout: config.default_timeout(),
            min_point_attempts: config.min_point_attempts,
        }
    }
}

/// Orchestrates fetches over the circuits of one session.
#[derive(Debug)]
pub struct Fetcher<T: Transport = RelayTransport> {
    session: Arc<Session>,
    transport: T,
    settings: FetchSettings,
}

impl Fetcher<RelayTransport> {
    /// Fetcher over the network transport, configured from `config`.
    pub fn from_config(session: Arc<Session>, config: &FetchConfig) -> Self {
        Self::new(
            session,
            RelayTransport::new(config.timeout_ceiling()),
            FetchSettings::from(config),
        )
    }
}

impl<T: Transport> Fetcher<T> {
    pub fn new(session: Arc<Session>, transport: T, settings: FetchSettings) -> Self {
        Self {
            session,
            transport,
            settings,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Fetch `request` through every circuit of its chain and return the
    /// payload both consensus rounds agree on.
    ///
    /// Fatal verdicts are returned as they are; nothing is retried here.
    pub async fn fetch(&self, request: &RpcRequest, timeout: Option<Duration>) -> FetchOutcome {
        let start = Instant::now();
        let outcome = self.consensus_round(request, self.timeout(timeout)).await;
        metrics::record_fetch(request.chain_id(), outcome.as_ref().map(|_| ()), start);
        outcome
    }

    /// Like [`fetch`](Self::fetch), but also aborts when `cancel` fires.
    ///
    /// `cancel` is raced against the whole fetch. The session token still
    /// cancels every exchange underneath it.
    pub async fn fetch_with_cancel(
        &self,
        request: &RpcRequest,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> FetchOutcome {
        let start = Instant::now();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(chain_id = %request.chain_id(), method = %request.method(), "Fetch cancelled by caller");
                metrics::record_fetch(request.chain_id(), Err(&FetchError::Cancelled), start);
                Err(FetchError::Cancelled)
            }
            outcome = self.fetch(request, timeout) => outcome,
        }
    }

    /// Ask one randomly drawn connection at a time until one answers.
    ///
    /// No consensus is applied. Suited to lookups whose answer is cheap to
    /// verify or not trust-sensitive.
    pub async fn point_read(&self, request: &RpcRequest, timeout: Option<Duration>) -> FetchOutcome {
        let chain_id = request.chain_id();
        let timeout = self.timeout(timeout);
        let cancel = self.session.cancel_token();

        let circuits = self.circuits(request)?;
        let candidates = circuits.candidates();
        let bounds = RetryBounds::for_source(&candidates, self.settings.min_point_attempts);

        let outcome = exclusion::run(&candidates, bounds, |connection| {
            self.transport.send(connection, request, timeout, cancel)
        })
        .await;

        let outcome = match outcome {
            Err(_) if cancel.is_cancelled() => Err(FetchError::Cancelled),
            other => other,
        };
        if let Err(e) = &outcome {
            tracing::debug!(chain_id = %chain_id, method = %request.method(), error = %e, "Point read failed");
        }
        metrics::record_point_read(outcome.as_ref().map(|_| ()));
        outcome
    }

    /// Repeat [`fetch`](Self::fetch) while the failure is worth retrying,
    /// backing off between rounds.
    ///
    /// Configuration and cancellation failures return immediately.
    pub async fn fetch_with_refetch(
        &self,
        request: &RpcRequest,
        timeout: Option<Duration>,
        policy: &RefetchPolicy,
    ) -> FetchOutcome {
        let cancel = self.session.cancel_token();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let error = match self.fetch(request, timeout).await {
                Ok(payload) => return Ok(payload),
                Err(e) => e,
            };

            let retryable = matches!(
                error.category(),
                FailureCategory::RetryLater | FailureCategory::Disagreement
            );
            if !retryable || attempt >= policy.max_attempts {
                return Err(error);
            }

            let delay = policy.delay_before(attempt);
            tracing::info!(
                chain_id = %request.chain_id(),
                method = %request.method(),
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Refetching after failure"
            );
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn timeout(&self, requested: Option<Duration>) -> Duration {
        requested.unwrap_or(self.settings.default_timeout)
    }

    fn circuits(&self, request: &RpcRequest) -> Result<Arc<CircuitPool>, FetchError> {
        let chain_id = request.chain_id();
        self.session.directory().get_pool(chain_id).ok_or_else(|| {
            tracing::warn!(chain_id = %chain_id, "No circuits configured for chain");
            FetchError::NoCircuits { chain_id }
        })
    }

    async fn consensus_round(&self, request: &RpcRequest, timeout: Duration) -> FetchOutcome {
        let cancel = self.session.cancel_token();
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        let circuits = self.circuits(request)?;

        let rounds = circuits
            .iter()
            .map(|pool| self.circuit_round(pool, request, timeout, cancel));
        let outcomes = join_all(rounds).await;

        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let verdict = vote("chain", outcomes);
        if let Err(e) = &verdict {
            tracing::warn!(
                chain_id = %request.chain_id(),
                method = %request.method(),
                circuits = circuits.capacity(),
                error = %e,
                "No trusted payload across circuits"
            );
        }
        verdict
    }

    async fn circuit_round(
        &self,
        pool: &ConnectionPool,
        request: &RpcRequest,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> FetchOutcome {
        let exchanges = pool
            .iter()
            .map(|connection| self.transport.send(connection, request, timeout, cancel));
        let outcomes = join_all(exchanges).await;

        let verdict = vote("circuit", outcomes);
        tracing::debug!(
            circuit = %pool.circuit(),
            connections = pool.capacity(),
            trusted = verdict.is_ok(),
            "Circuit verdict"
        );
        verdict
    }
}

/// One majority vote, shared by both levels.
fn vote(level: &'static str, outcomes: Vec<FetchOutcome>) -> FetchOutcome {
    let verdict = tracing::debug_span!("vote", round = level).in_scope(|| consensus::resolve(outcomes));
    metrics::record_consensus_round(level, verdict.as_ref().map(|_| ()));
    verdict
}
