//! Command handlers grouped by concern.

use tracing::warn;
use tradedesk_core::RemoteFetchError;
use tradedesk_sync::{Notice, RefreshOutcome};

pub(crate) mod accounts;
pub(crate) mod billing;
pub(crate) mod dashboard;
pub(crate) mod endpoint;

/// Surface a failed follow-up reload without failing the write that caused it.
pub(crate) fn report_stale_listing(refresh: Option<&Result<RefreshOutcome, RemoteFetchError>>) {
    if let Some(Err(err)) = refresh {
        warn!(error = %err, "account listing not reloaded after write");
        eprintln!("warning: {}", Notice::load_failed(err));
    }
}
