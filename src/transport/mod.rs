//! Transport subsystem.
//!
//! # Data Flow
//! ```text
//! Transport::send(connection, request, timeout, cancel)
//!     → timeout = min(requested, ceiling)
//!     → match connection kind:
//!         Url    → http.rs (independent POST exchange)
//!         Stream → acquire cooldown gate, then stream.rs (send frame, await matching reply)
//!     → reply.rs (JSON-RPC result / error extraction)
//!     → Ok(payload) | Err(transient TransportError) | Err(Cancelled)
//! ```
//!
//! # Design Decisions
//! - Connection kinds are a closed enum dispatched with an exhaustive `match`
//! - Every exchange races a deadline and the caller's cancellation token
//! - The deadline starts once a stream's gate is held; waiting for the gate only races cancellation
//! - All transport failures are transient except cancellation

pub mod error;
pub mod http;
pub mod reply;
pub mod stream;

pub use error::TransportError;

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::circuit::{Connection, ConnectionKind};
use crate::fetch::{FetchError, FetchOutcome, Payload, RpcRequest};
use crate::observability::metrics;
use crate::resilience::timeouts::{effective_timeout, DEFAULT_TIMEOUT_CEILING};

/// Sends one request over one connection.
pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        connection: &'a Connection,
        request: &'a RpcRequest,
        timeout: Duration,
        cancel: &'a CancellationToken,
    ) -> impl Future<Output = FetchOutcome> + Send + 'a;
}

/// The network transport used in production.
#[derive(Debug, Clone, Copy)]
pub struct RelayTransport {
    ceiling: Duration,
}

impl RelayTransport {
    pub fn new(ceiling: Duration) -> Self {
        Self { ceiling }
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }
}

impl Default for RelayTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_CEILING)
    }
}

impl Transport for RelayTransport {
    fn send<'a>(
        &'a self,
        connection: &'a Connection,
        request: &'a RpcRequest,
        timeout: Duration,
        cancel: &'a CancellationToken,
    ) -> impl Future<Output = FetchOutcome> + Send + 'a {
        let limit = effective_timeout(timeout, self.ceiling);

        async move {
            let result = match connection {
                Connection::Url(c) => bounded(limit, cancel, http::exchange(c, request)).await,
                Connection::Stream(c) => {
                    // Time spent queued on the gate is not part of the deadline.
                    let gate = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        socket = c.acquire() => Some(socket),
                    };
                    match gate {
                        Some(mut socket) => {
                            bounded(limit, cancel, stream::exchange(&mut socket, c, request)).await
                        }
                        None => Err(TransportError::Cancelled),
                    }
                }
            };

            if let Err(e) = &result {
                tracing::debug!(
                    connection_id = %connection.id(),
                    circuit = %connection.circuit(),
                    method = %request.method(),
                    error = %e,
                    "Exchange failed"
                );
                metrics::record_transport_failure(kind_label(connection.kind()), e);
            }

            result.map_err(FetchError::from)
        }
    }
}

/// Race one exchange against its deadline and the cancellation token.
async fn bounded<F>(limit: Duration, cancel: &CancellationToken, exchange: F) -> Result<Payload, TransportError>
where
    F: Future<Output = Result<Payload, TransportError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TransportError::Cancelled),
        res = tokio::time::timeout(limit, exchange) => res.unwrap_or(Err(TransportError::Timeout(limit))),
    }
}

fn kind_label(kind: ConnectionKind) -> &'static str {
    match kind {
        ConnectionKind::Url => "url",
        ConnectionKind::Stream => "stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{CircuitId, UrlCircuit};
    use tokio::net::TcpListener;

    /// A node that accepts connections and never answers.
    async fn silent_node() -> Connection {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        UrlCircuit::new(
            CircuitId::new("silent"),
            format!("http://{}", addr).parse().unwrap(),
            reqwest::Client::builder().no_proxy().build().unwrap(),
        )
        .into()
    }

    #[tokio::test]
    async fn test_ceiling_overrides_longer_timeout() {
        let transport = RelayTransport::new(Duration::from_millis(150));
        let conn = silent_node().await;
        let request = RpcRequest::new(1u64, "eth_blockNumber", vec![]);

        let started = std::time::Instant::now();
        let outcome = transport
            .send(&conn, &request, Duration::from_secs(60), &CancellationToken::new())
            .await;

        assert_eq!(
            outcome.unwrap_err(),
            FetchError::Transport(TransportError::Timeout(Duration::from_millis(150)))
        );
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_cancellation_is_fatal() {
        let transport = RelayTransport::default();
        let conn = silent_node().await;
        let request = RpcRequest::new(1u64, "eth_blockNumber", vec![]);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = transport
            .send(&conn, &request, Duration::from_secs(5), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Transport(TransportError::Cancelled));
        assert_eq!(err.kind(), crate::fetch::FailureKind::Fatal);
    }

    #[tokio::test]
    async fn test_refused_connection_is_transient() {
        // Bind then drop to get a port nobody listens on.
        let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
        let conn: Connection = UrlCircuit::new(
            CircuitId::new("dead"),
            format!("http://{}", addr).parse().unwrap(),
            reqwest::Client::builder().no_proxy().build().unwrap(),
        )
        .into();

        let err = RelayTransport::default()
            .send(
                &conn,
                &RpcRequest::new(1u64, "eth_chainId", vec![]),
                Duration::from_secs(2),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::fetch::FailureKind::Transient);
        assert!(!err.to_string().contains(&addr.to_string()), "endpoint leaked: {}", err);
    }
}
