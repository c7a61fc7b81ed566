//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FetcherConfig (validated, immutable)
//!     → lifecycle::Session::connect builds the circuit directory from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a new session is needed to change circuits
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ChainConfig, CircuitConfig, FetchConfig, FetcherConfig, LogFormat, ObservabilityConfig,
    RefetchConfig,
};
pub use validation::ValidationError;
