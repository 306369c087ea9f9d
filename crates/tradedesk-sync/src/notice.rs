//! User-facing outcome messages for every flow.

use std::fmt;

use serde::Serialize;
use tradedesk_core::{PromoRedemption, RemoteFetchError, RemoteWriteError};

use crate::billing::Subscription;
use crate::connectivity::ProbeOutcome;
use crate::error::{EndpointError, FlowError};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// The operation succeeded.
    Success,
    /// The operation failed or was refused locally.
    Error,
}

/// Short title and description describing an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Headline.
    pub title: String,
    /// Detail line.
    pub description: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

impl Notice {
    fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description: description.into(),
        }
    }

    /// Whether the notice reports a success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.level, NoticeLevel::Success)
    }

    /// Registration accepted.
    #[must_use]
    pub fn registered() -> Self {
        Self::success("Success!", "Account registered successfully")
    }

    /// Registration refused locally or remotely.
    #[must_use]
    pub fn registration_failed(err: &FlowError) -> Self {
        match err {
            FlowError::Validation(_) => Self::error("Error", "Please fill in all required fields"),
            FlowError::Remote(remote) => Self::error("Registration Failed", &remote.message),
        }
    }

    /// Account removed.
    #[must_use]
    pub fn deleted() -> Self {
        Self::success(
            "Account Deleted",
            "Trading account has been successfully deleted",
        )
    }

    /// Account removal failed.
    #[must_use]
    pub fn deletion_failed(err: &RemoteWriteError) -> Self {
        Self::error("Error", &err.message)
    }

    /// Listing could not be loaded.
    #[must_use]
    pub fn load_failed(err: &RemoteFetchError) -> Self {
        Self::error("Error", &err.message)
    }

    /// Result of a manual connection test.
    #[must_use]
    pub fn connection(outcome: &ProbeOutcome) -> Self {
        match outcome {
            ProbeOutcome::Online { platform } => Self::success(
                "Connection Successful",
                format!(
                    "Connected to {} server",
                    platform.as_deref().unwrap_or("trading")
                ),
            ),
            ProbeOutcome::Offline { reason } => Self::error("Connection Failed", reason),
        }
    }

    /// Endpoint committed.
    #[must_use]
    pub fn endpoint_saved() -> Self {
        Self::success(
            "Configuration Saved",
            "API configuration updated successfully",
        )
    }

    /// Endpoint not committed.
    #[must_use]
    pub fn endpoint_rejected(err: &EndpointError) -> Self {
        match err {
            EndpointError::Config(_) => Self::error("Error", "Please enter a valid API URL"),
            EndpointError::Unreachable { reason, .. } => Self::error("Connection Failed", reason),
        }
    }

    /// Subscription activated; names the chosen tier.
    #[must_use]
    pub fn subscribed(subscription: &Subscription) -> Self {
        Self::success(
            "Subscription Successful!",
            format!(
                "Your {} plan is active until {}",
                subscription.tier.id, subscription.receipt.active_until
            ),
        )
    }

    /// Subscription refused.
    #[must_use]
    pub fn subscription_failed(err: &FlowError) -> Self {
        Self::error("Subscription Failed", err.to_string())
    }

    /// Promo code accepted.
    #[must_use]
    pub fn redeemed(redemption: &PromoRedemption) -> Self {
        Self::success(
            "Promo Code Redeemed!",
            format!(
                "You received {}% discount for {} days",
                redemption.discount_percent, redemption.days
            ),
        )
    }

    /// Promo code refused locally or remotely.
    #[must_use]
    pub fn redemption_failed(err: &FlowError) -> Self {
        match err {
            FlowError::Validation(violations) if violations.has("code") => {
                Self::error("Error", "Please enter a promo code")
            }
            other => Self::error("Redemption Failed", other.to_string()),
        }
    }
}
