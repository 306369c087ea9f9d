//! Display statistics derived from an account snapshot.

use std::collections::HashSet;

use serde::Serialize;
use tradedesk_core::{AccountSnapshot, OwnerId, TradingAccount};

/// Summary figures shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    /// Number of accounts.
    pub total_accounts: usize,
    /// Number of distinct platforms across the accounts.
    pub distinct_platforms: usize,
    /// Accounts on the `Premium` or `Pro` plan.
    pub premium_count: usize,
}

/// Compute dashboard figures for `accounts`.
#[must_use]
pub fn aggregate(accounts: &[TradingAccount]) -> DashboardStats {
    let platforms: HashSet<_> = accounts.iter().map(|a| &a.platform).collect();
    DashboardStats {
        total_accounts: accounts.len(),
        distinct_platforms: platforms.len(),
        premium_count: accounts.iter().filter(|a| a.plan.is_premium()).count(),
    }
}

impl From<&AccountSnapshot> for DashboardStats {
    fn from(snapshot: &AccountSnapshot) -> Self {
        aggregate(&snapshot.accounts)
    }
}

/// Whether an identity is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// An identity is signed in.
    Authenticated,
    /// No identity.
    NotLoggedIn,
}

impl SessionStatus {
    /// Status for an optional identity.
    #[must_use]
    pub const fn for_identity(identity: Option<&OwnerId>) -> Self {
        if identity.is_some() {
            Self::Authenticated
        } else {
            Self::NotLoggedIn
        }
    }

    /// Label for status displays.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Authenticated => "Authenticated",
            Self::NotLoggedIn => "Not Logged In",
        }
    }
}
