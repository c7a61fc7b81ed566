//! Circuit directory: chain id → pool of circuit pools.
//!
//! # Responsibilities
//! - Group connection pools by the network they serve
//! - Answer `get_pool(chain_id)` for the orchestrator
//! - Flatten a chain's connections into a candidate source for point reads

use std::collections::HashMap;
use std::sync::Arc;

use crate::chain::ChainId;
use crate::circuit::connection::Connection;
use crate::circuit::pool::ConnectionPool;
use crate::resilience::exclusion::CandidateSource;

/// Fixed-capacity pool whose entries are the connection pools of one chain,
/// one per circuit.
#[derive(Debug)]
pub struct CircuitPool {
    pools: Box<[ConnectionPool]>,
}

impl CircuitPool {
    pub fn new(pools: Vec<ConnectionPool>) -> Self {
        Self {
            pools: pools.into_boxed_slice(),
        }
    }

    /// Number of circuits.
    pub fn capacity(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ConnectionPool> {
        self.pools.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectionPool> {
        self.pools.iter()
    }

    /// Total connections across every circuit.
    pub fn connection_count(&self) -> usize {
        self.pools.iter().map(ConnectionPool::capacity).sum()
    }

    /// Every connection of every circuit, as one candidate source.
    pub fn candidates(&self) -> ConnectionCandidates<'_> {
        ConnectionCandidates {
            connections: self.pools.iter().flat_map(|p| p.connections().iter()).collect(),
        }
    }
}

/// Borrowed, flattened view over the connections of a chain.
#[derive(Debug)]
pub struct ConnectionCandidates<'a> {
    connections: Vec<&'a Connection>,
}

impl CandidateSource for ConnectionCandidates<'_> {
    type Candidate = Connection;

    fn len(&self) -> usize {
        self.connections.len()
    }

    fn get(&self, index: usize) -> Option<&Connection> {
        self.connections.get(index).copied()
    }

    fn identity(&self, index: usize) -> Option<u64> {
        self.connections.get(index).map(|c| c.id().as_u64())
    }
}

/// Mapping from chain id to that chain's circuits.
///
/// Built once per session and read-only afterwards.
#[derive(Debug, Default)]
pub struct CircuitDirectory {
    chains: HashMap<ChainId, Arc<CircuitPool>>,
}

impl CircuitDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the circuits of `chain_id`, replacing any previous entry.
    pub fn insert(&mut self, chain_id: ChainId, pool: CircuitPool) {
        if self.chains.insert(chain_id, Arc::new(pool)).is_some() {
            tracing::warn!(chain_id = %chain_id, "Replacing circuit pool for chain");
        }
    }

    /// Look up the circuits serving `chain_id`.
    pub fn get_pool(&self, chain_id: ChainId) -> Option<Arc<CircuitPool>> {
        self.chains.get(&chain_id).cloned()
    }

    /// Chains with circuits configured.
    pub fn chains(&self) -> impl Iterator<Item = ChainId> + '_ {
        self.chains.keys().copied()
    }

    /// Every connection in the directory, across chains.
    pub(crate) fn all_connections(&self) -> impl Iterator<Item = &Connection> {
        self.chains
            .values()
            .flat_map(|circuits| circuits.pools.iter())
            .flat_map(|pool| pool.connections().iter())
    }
}
