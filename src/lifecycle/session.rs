//! Session: the circuit directory plus the token that ends it.

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::circuit::{
    CircuitDirectory, CircuitId, CircuitPool, Connection, ConnectionPool, StreamCircuit,
    UrlCircuit,
};
use crate::config::validation::{endpoint_scheme, EndpointScheme};
use crate::config::{CircuitConfig, FetcherConfig};
use crate::transport::TransportError;

/// Errors raised while building a session from configuration.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("circuit '{circuit}' has an unusable endpoint")]
    InvalidEndpoint { circuit: String },

    #[error("circuit '{circuit}' has an unusable proxy")]
    InvalidProxy { circuit: String },

    #[error("circuit '{circuit}' puts a stream endpoint behind its proxy")]
    ProxiedStream { circuit: String },

    #[error("circuit '{circuit}': client construction failed: {source}")]
    Client {
        circuit: String,
        #[source]
        source: TransportError,
    },
}

/// Owns the circuit directory for its lifetime.
///
/// Cancelling the session token aborts every fetch started under it.
/// Dropping the session cancels the token.
#[derive(Debug)]
pub struct Session {
    directory: CircuitDirectory,
    cancel: CancellationToken,
}

impl Session {
    /// Wrap an already built directory.
    pub fn new(directory: CircuitDirectory) -> Self {
        Self {
            directory,
            cancel: CancellationToken::new(),
        }
    }

    /// Build every configured circuit.
    ///
    /// Url connections are constructed eagerly. Stream connections are dialed
    /// here; a stream that fails to connect is logged and left out of its pool.
    pub async fn connect(config: &FetcherConfig) -> Result<Self, SessionError> {
        let connect_timeout = config.fetch.connect_timeout();
        let mut directory = CircuitDirectory::new();

        for chain in &config.chains {
            let mut pools = Vec::with_capacity(chain.circuits.len());
            for circuit in &chain.circuits {
                pools.push(build_pool(circuit, connect_timeout).await?);
            }
            let pool = CircuitPool::new(pools);
            tracing::info!(
                chain_id = %chain.chain_id,
                circuits = pool.capacity(),
                connections = pool.connection_count(),
                "Chain circuits ready"
            );
            directory.insert(chain.chain_id, pool);
        }

        Ok(Self::new(directory))
    }

    pub fn directory(&self) -> &CircuitDirectory {
        &self.directory
    }

    /// Token cancelled when the session ends.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel outstanding fetches and close every stream connection.
    pub async fn close(self) {
        self.cancel.cancel();
        for connection in self.directory.all_connections() {
            if let Connection::Stream(stream) = connection {
                stream.close().await;
            }
        }
        tracing::info!("Session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn build_pool(
    config: &CircuitConfig,
    connect_timeout: std::time::Duration,
) -> Result<ConnectionPool, SessionError> {
    let circuit = CircuitId::new(&config.name);
    let proxy = config
        .proxy
        .as_deref()
        .map(Url::parse)
        .transpose()
        .map_err(|_| SessionError::InvalidProxy {
            circuit: config.name.clone(),
        })?;

    let mut connections: Vec<Connection> = Vec::with_capacity(config.endpoints.len());
    for raw in &config.endpoints {
        let invalid = || SessionError::InvalidEndpoint {
            circuit: config.name.clone(),
        };
        let endpoint = Url::parse(raw).map_err(|_| invalid())?;

        match endpoint_scheme(&endpoint).ok_or_else(invalid)? {
            EndpointScheme::Url => {
                let connection =
                    UrlCircuit::build(circuit.clone(), endpoint, proxy.as_ref(), connect_timeout)
                        .map_err(|source| SessionError::Client {
                            circuit: config.name.clone(),
                            source,
                        })?;
                connections.push(connection.into());
            }
            // Streams are dialed directly, which would bypass the circuit's proxy.
            EndpointScheme::Stream if proxy.is_some() => {
                return Err(SessionError::ProxiedStream {
                    circuit: config.name.clone(),
                });
            }
            EndpointScheme::Stream => {
                let dial = StreamCircuit::connect(circuit.clone(), endpoint);
                let result = tokio::time::timeout(connect_timeout, dial)
                    .await
                    .unwrap_or(Err(TransportError::Timeout(connect_timeout)));
                match result {
                    Ok(connection) => connections.push(connection.into()),
                    Err(e) => {
                        tracing::warn!(error = %e, "Stream connection failed, omitting it");
                        tracing::debug!(circuit = %circuit, endpoint = %raw, "Omitted stream endpoint");
                    }
                }
            }
        }
    }

    Ok(ConnectionPool::new(circuit, connections))
}
