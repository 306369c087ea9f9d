//! Error types for constructing the HTTP adapter.

use thiserror::Error;

/// Failures raised while building the HTTP client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The underlying `reqwest` client could not be built.
    #[error("failed to build HTTP client")]
    Build {
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}

/// Convenience alias for adapter construction results.
pub type ClientResult<T> = Result<T, ClientError>;
