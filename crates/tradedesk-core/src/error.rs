//! Error types for remote account operations and local validation.

use std::fmt;

use thiserror::Error;

/// Failure reported by an [`crate::AccountStore`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The request never produced a response (connect failure, timeout, DNS).
    #[error("{operation} request failed: {message}")]
    Transport {
        /// Operation identifier.
        operation: &'static str,
        /// Transport error description.
        message: String,
    },
    /// The server answered with a non-success status.
    #[error("{operation} returned status {status}")]
    Status {
        /// Operation identifier.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// `error` field of the response body when present.
        message: Option<String>,
    },
    /// The response body could not be interpreted.
    #[error("{operation} returned a malformed response: {message}")]
    Malformed {
        /// Operation identifier.
        operation: &'static str,
        /// Decoding failure description.
        message: String,
    },
}

impl RemoteError {
    /// Message supplied by the server in its error body, if any.
    #[must_use]
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message.as_str()),
            _ => None,
        }
    }

    /// Whether the server reported the target as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// Convenience alias for remote store results.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Read-path failure while loading the account listing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteFetchError {
    /// Upstream message, or a generic one when the server gave none.
    pub message: String,
    /// Underlying remote failure.
    #[source]
    pub source: RemoteError,
}

impl RemoteFetchError {
    /// Generic message used when the server supplies none.
    pub const GENERIC_MESSAGE: &'static str = "Failed to load trading accounts";

    /// Wrap a remote failure, preferring the upstream message.
    #[must_use]
    pub fn from_remote(source: RemoteError) -> Self {
        let message = source
            .upstream_message()
            .unwrap_or(Self::GENERIC_MESSAGE)
            .to_string();
        Self { message, source }
    }
}

/// Category of a failed remote write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFailureKind {
    /// The server refused the request.
    Rejected,
    /// The target does not exist on the server.
    NotFound,
    /// The request never produced a response.
    Transport,
    /// The response could not be interpreted.
    Malformed,
}

impl WriteFailureKind {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rejected => "rejected",
            Self::NotFound => "not_found",
            Self::Transport => "transport",
            Self::Malformed => "malformed",
        }
    }
}

impl fmt::Display for WriteFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write-path failure for registration, deletion and billing calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteWriteError {
    /// Failure category.
    pub kind: WriteFailureKind,
    /// Upstream message, or the operation's generic message.
    pub message: String,
}

impl RemoteWriteError {
    /// Build a write error directly.
    #[must_use]
    pub fn new(kind: WriteFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify a remote failure, preferring the upstream message over `generic`.
    #[must_use]
    pub fn from_remote(err: &RemoteError, generic: &str) -> Self {
        let kind = match err {
            RemoteError::Transport { .. } => WriteFailureKind::Transport,
            RemoteError::Malformed { .. } => WriteFailureKind::Malformed,
            status if status.is_not_found() => WriteFailureKind::NotFound,
            RemoteError::Status { .. } => WriteFailureKind::Rejected,
        };
        let message = err.upstream_message().unwrap_or(generic);
        Self::new(kind, message)
    }
}

/// Single failing field reported by local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Field name as presented to the user.
    pub field: &'static str,
    /// Human-readable reason.
    pub reason: String,
}

/// Local validation failure listing every failing field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationError {
    /// Violations in field order.
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Record a failing field.
    pub fn push(&mut self, field: &'static str, reason: impl Into<String>) {
        self.violations.push(FieldViolation {
            field,
            reason: reason.into(),
        });
    }

    /// Whether no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Names of the failing fields.
    #[must_use]
    pub fn fields(&self) -> Vec<&'static str> {
        self.violations.iter().map(|v| v.field).collect()
    }

    /// Whether the given field failed.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// `Ok(value)` when nothing failed, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one violation was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("validation failed")?;
        for (index, violation) in self.violations.iter().enumerate() {
            let sep = if index == 0 { ": " } else { "; " };
            write!(f, "{sep}{} {}", violation.field, violation.reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
