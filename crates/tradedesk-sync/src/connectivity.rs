//! Liveness probing against the remote account service.

use serde::Serialize;
use tracing::{info, warn};
use tradedesk_config::Endpoint;
use tradedesk_core::{AccountStore, RemoteError};

/// Result of one liveness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The service answered successfully.
    Online {
        /// Platform label reported by the service, display only.
        platform: Option<String>,
    },
    /// The service did not answer successfully.
    Offline {
        /// Human-readable reason.
        reason: String,
    },
}

impl ProbeOutcome {
    /// Whether the probe succeeded.
    #[must_use]
    pub const fn is_online(&self) -> bool {
        matches!(self, Self::Online { .. })
    }
}

/// Connectivity signal for the committed endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Connectivity {
    /// No probe has completed for the committed endpoint.
    #[default]
    Unknown,
    /// The most recent probe succeeded.
    Online {
        /// Platform label reported by the service.
        platform: Option<String>,
    },
    /// The most recent probe failed.
    Offline {
        /// Human-readable reason.
        reason: String,
    },
}

impl Connectivity {
    /// Short label for status displays.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Online { .. } => "Connected",
            Self::Offline { .. } => "Disconnected",
        }
    }
}

impl From<ProbeOutcome> for Connectivity {
    fn from(outcome: ProbeOutcome) -> Self {
        match outcome {
            ProbeOutcome::Online { platform } => Self::Online { platform },
            ProbeOutcome::Offline { reason } => Self::Offline { reason },
        }
    }
}

/// Issue one `GET /health` against `endpoint`.
///
/// Never fails: transport errors, timeouts and non-success statuses are all
/// reported as [`ProbeOutcome::Offline`].
pub async fn probe(store: &dyn AccountStore, endpoint: &Endpoint) -> ProbeOutcome {
    match store.health(endpoint).await {
        Ok(report) => {
            info!(endpoint = %endpoint, platform = ?report.platform, "account service reachable");
            ProbeOutcome::Online {
                platform: report.platform,
            }
        }
        Err(err) => {
            let reason = offline_reason(&err);
            warn!(endpoint = %endpoint, reason = %reason, "account service unreachable");
            ProbeOutcome::Offline { reason }
        }
    }
}

fn offline_reason(err: &RemoteError) -> String {
    match err {
        RemoteError::Transport { message, .. } => message.clone(),
        RemoteError::Status {
            status,
            message: Some(message),
            ..
        } => format!("server responded with status {status}: {message}"),
        RemoteError::Status { status, .. } => format!("server responded with status {status}"),
        RemoteError::Malformed { message, .. } => format!("unexpected response: {message}"),
    }
}
