//! Error types for configuration operations.

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Endpoint input was empty after trimming.
    #[error("endpoint URL must not be empty")]
    EmptyEndpoint,
    /// Endpoint input was not an absolute HTTP(S) URL.
    #[error("invalid endpoint URL '{value}': {reason}")]
    InvalidEndpoint {
        /// Normalized input provided by the caller.
        value: String,
        /// Human-readable reason for the failure.
        reason: String,
    },
    /// A settings field contained an invalid value.
    #[error("invalid value for '{field}': {reason}")]
    InvalidField {
        /// Name of the offending field or environment variable.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
