//! Error types for synchronisation flows.

use thiserror::Error;
use tradedesk_config::{ConfigError, Endpoint};
use tradedesk_core::{RemoteWriteError, ValidationError};

/// Failure while testing or committing an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    /// The input could not be normalized into an endpoint.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The candidate endpoint did not answer its liveness check.
    #[error("could not connect to {endpoint}: {reason}")]
    Unreachable {
        /// Normalized candidate endpoint.
        endpoint: Endpoint,
        /// Reason reported by the probe.
        reason: String,
    },
}

/// Failure of a validated write flow (registration, billing).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// Local validation rejected the input; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The remote store refused or failed the write.
    #[error(transparent)]
    Remote(#[from] RemoteWriteError),
}
