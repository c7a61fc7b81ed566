//! Fixed-capacity connection pools.
//!
//! # Responsibilities
//! - Own the connections of exactly one circuit
//! - Provide indexed and uniformly random access

use rand::rngs::OsRng;
use rand::seq::SliceRandom;

use crate::circuit::connection::{CircuitId, Connection};

/// Ordered, fixed-capacity set of connections belonging to one circuit.
///
/// Capacity is set at construction and never changes. Connections are
/// owned by the pool, so a connection cannot sit in two pools at once.
#[derive(Debug)]
pub struct ConnectionPool {
    circuit: CircuitId,
    connections: Box<[Connection]>,
}

impl ConnectionPool {
    /// Create a pool from connections already established on `circuit`.
    ///
    /// Connections that claim a different circuit are dropped with a warning.
    pub fn new(circuit: CircuitId, connections: Vec<Connection>) -> Self {
        let connections: Vec<Connection> = connections
            .into_iter()
            .filter(|c| {
                let same = c.circuit() == &circuit;
                if !same {
                    tracing::warn!(
                        pool = %circuit,
                        connection_id = %c.id(),
                        "Connection belongs to another circuit, not pooling it"
                    );
                }
                same
            })
            .collect();

        Self {
            circuit,
            connections: connections.into_boxed_slice(),
        }
    }

    pub fn circuit(&self) -> &CircuitId {
        &self.circuit
    }

    /// Declared capacity of the pool.
    pub fn capacity(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Connection> {
        self.connections.get(index)
    }

    /// Pick one connection uniformly at random using the OS RNG.
    pub fn random(&self) -> Option<&Connection> {
        self.connections.choose(&mut OsRng)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter()
    }

    pub(crate) fn connections(&self) -> &[Connection] {
        &self.connections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::connection::UrlCircuit;

    fn url_conn(circuit: &str, port: u16) -> Connection {
        UrlCircuit::new(
            CircuitId::new(circuit),
            format!("http://127.0.0.1:{}", port).parse().unwrap(),
            reqwest::Client::new(),
        )
        .into()
    }

    #[test]
    fn test_pool_capacity_and_access() {
        let pool = ConnectionPool::new(
            CircuitId::new("a"),
            vec![url_conn("a", 1), url_conn("a", 2), url_conn("a", 3)],
        );
        assert_eq!(pool.capacity(), 3);
        assert_eq!(pool.get(1).unwrap().endpoint().port(), Some(2));
        assert!(pool.get(3).is_none());
        assert!(pool.random().is_some());
    }

    #[test]
    fn test_foreign_connections_are_rejected() {
        let pool = ConnectionPool::new(CircuitId::new("a"), vec![url_conn("a", 1), url_conn("b", 2)]);
        assert_eq!(pool.capacity(), 1);
        assert!(pool.iter().all(|c| c.circuit().as_str() == "a"));
    }

    #[test]
    fn test_empty_pool() {
        let pool = ConnectionPool::new(CircuitId::new("a"), Vec::new());
        assert!(pool.is_empty());
        assert!(pool.random().is_none());
    }
}
