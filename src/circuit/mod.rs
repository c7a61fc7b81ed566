//! Circuit subsystem.
//!
//! # Data Flow
//! ```text
//! Session construction
//!     → connection.rs (UrlCircuit / StreamCircuit, already established)
//!     → pool.rs (fixed-capacity ConnectionPool per circuit)
//!     → directory.rs (CircuitPool per chain, CircuitDirectory per session)
//!     → borrowed read-only by the fetch orchestrator
//! ```
//!
//! # Design Decisions
//! - Pools own their connections; capacity never changes after construction
//! - The engine borrows connections for one request and never creates them
//! - Random access uses the OS RNG so circuit selection is not predictable

pub mod connection;
pub mod directory;
pub mod pool;

pub use connection::{CircuitId, Connection, ConnectionId, ConnectionKind, StreamCircuit, UrlCircuit, WsStream};
pub use directory::{CircuitDirectory, CircuitPool, ConnectionCandidates};
pub use pool::ConnectionPool;
