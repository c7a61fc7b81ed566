//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, default within ceiling)
//! - Check uniqueness of chains and circuit names
//! - Check every endpoint and proxy URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FetcherConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::chain::ChainId;
use crate::config::schema::FetcherConfig;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("fetch.timeout_ceiling_ms must be greater than zero")]
    ZeroCeiling,

    #[error("fetch.default_timeout_ms ({default_ms}) exceeds fetch.timeout_ceiling_ms ({ceiling_ms})")]
    DefaultAboveCeiling { default_ms: u64, ceiling_ms: u64 },

    #[error("refetch.max_delay_ms ({max_ms}) is below refetch.base_delay_ms ({base_ms})")]
    RefetchDelays { base_ms: u64, max_ms: u64 },

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),

    #[error("chain {0} is configured more than once")]
    DuplicateChain(ChainId),

    #[error("chain {chain_id}: circuit '{name}' is configured more than once")]
    DuplicateCircuit { chain_id: ChainId, name: String },

    #[error("chain {chain_id}: circuit '{circuit}' has invalid endpoint '{endpoint}'")]
    InvalidEndpoint { chain_id: ChainId, circuit: String, endpoint: String },

    #[error("chain {chain_id}: circuit '{circuit}' has invalid proxy URL")]
    InvalidProxy { chain_id: ChainId, circuit: String },

    #[error("chain {chain_id}: circuit '{circuit}' routes a stream endpoint through a proxy, which is unsupported")]
    ProxiedStream { chain_id: ChainId, circuit: String },
}

/// Endpoint kinds recognised by URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointScheme {
    Url,
    Stream,
}

/// Classify an endpoint by scheme; `None` for anything unsupported.
pub fn endpoint_scheme(endpoint: &Url) -> Option<EndpointScheme> {
    match endpoint.scheme() {
        "http" | "https" => Some(EndpointScheme::Url),
        "ws" | "wss" => Some(EndpointScheme::Stream),
        _ => None,
    }
}

/// Check `config` and return every problem found.
pub fn validate_config(config: &FetcherConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // 1. Fetch timeouts
    if config.fetch.timeout_ceiling_ms == 0 {
        errors.push(ValidationError::ZeroCeiling);
    }
    if config.fetch.default_timeout_ms > config.fetch.timeout_ceiling_ms {
        errors.push(ValidationError::DefaultAboveCeiling {
            default_ms: config.fetch.default_timeout_ms,
            ceiling_ms: config.fetch.timeout_ceiling_ms,
        });
    }

    // 2. Refetch delays
    if config.refetch.max_delay_ms < config.refetch.base_delay_ms {
        errors.push(ValidationError::RefetchDelays {
            base_ms: config.refetch.base_delay_ms,
            max_ms: config.refetch.max_delay_ms,
        });
    }

    // 3. Metrics
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    // 4. Chains and circuits
    let mut chains = HashSet::new();
    for chain in &config.chains {
        if !chains.insert(chain.chain_id) {
            errors.push(ValidationError::DuplicateChain(chain.chain_id));
        }

        let mut names = HashSet::new();
        for circuit in &chain.circuits {
            if !names.insert(circuit.name.as_str()) {
                errors.push(ValidationError::DuplicateCircuit {
                    chain_id: chain.chain_id,
                    name: circuit.name.clone(),
                });
            }

            if let Some(proxy) = &circuit.proxy {
                if Url::parse(proxy).is_err() {
                    errors.push(ValidationError::InvalidProxy {
                        chain_id: chain.chain_id,
                        circuit: circuit.name.clone(),
                    });
                }
            }

            let mut proxied_stream = false;
            for endpoint in &circuit.endpoints {
                match Url::parse(endpoint).ok().as_ref().and_then(endpoint_scheme) {
                    Some(EndpointScheme::Stream) if circuit.proxy.is_some() => proxied_stream = true,
                    Some(_) => {}
                    None => errors.push(ValidationError::InvalidEndpoint {
                        chain_id: chain.chain_id,
                        circuit: circuit.name.clone(),
                        endpoint: endpoint.clone(),
                    }),
                }
            }
            if proxied_stream {
                errors.push(ValidationError::ProxiedStream {
                    chain_id: chain.chain_id,
                    circuit: circuit.name.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
