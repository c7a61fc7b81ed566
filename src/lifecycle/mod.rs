//! Session lifecycle.
//!
//! # Data Flow
//! ```text
//! Session::connect(config):
//!     For each chain → for each circuit → build url clients, dial streams
//!     → CircuitDirectory
//!
//! Session::close():
//!     Cancel token → in-flight fetches resolve Cancelled → close streams
//! ```
//!
//! # Design Decisions
//! - The directory is immutable for the session's lifetime
//! - Dropping the session cancels outstanding fetches

pub mod session;

pub use session::{Session, SessionError};
