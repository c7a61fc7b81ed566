//! Transport-level failures.
//!
//! Every variant except `Cancelled` describes a failure of one exchange on
//! one connection and is safe to retry on a different candidate.
//! None of them carries an endpoint address or circuit name.

use std::time::Duration;
use thiserror::Error;

/// Errors produced by a single exchange on a single connection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused, reset, DNS failure, proxy failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The endpoint answered with a non-success HTTP status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The exchange did not complete within the effective timeout.
    #[error("Exchange timed out after {0:?}")]
    Timeout(Duration),

    /// The response could not be parsed as a JSON-RPC reply to our request.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The node answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The persistent channel was closed by the remote side.
    #[error("Stream channel closed")]
    Closed,

    /// The caller's cancellation signal fired.
    #[error("Exchange cancelled")]
    Cancelled,
}

impl TransportError {
    /// True when retrying on another candidate is meaningful.
    pub fn is_transient(&self) -> bool {
        !matches!(self, TransportError::Cancelled)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        // Strip the URL so the circuit endpoint never leaks into error text.
        let e = e.without_url();
        if e.is_decode() {
            TransportError::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            TransportError::Status(status.as_u16())
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match e {
            WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::Closed,
            other => TransportError::Network(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_cancellation_is_not_transient() {
        assert!(TransportError::Network("reset".into()).is_transient());
        assert!(TransportError::Status(502).is_transient());
        assert!(TransportError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(TransportError::Malformed("eof".into()).is_transient());
        assert!(TransportError::Rpc { code: -32000, message: "header not found".into() }.is_transient());
        assert!(TransportError::Closed.is_transient());
        assert!(!TransportError::Cancelled.is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = TransportError::Rpc { code: -32601, message: "method not found".into() };
        assert_eq!(err.to_string(), "RPC error -32601: method not found");
        assert_eq!(TransportError::Status(503).to_string(), "HTTP status 503");
    }
}
