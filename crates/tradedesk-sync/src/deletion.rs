//! Confirmation-gated removal of one trading account.

use std::sync::Arc;

use tracing::{info, warn};
use tradedesk_core::{AccountId, AccountStore, RemoteWriteError};

use crate::endpoint::EndpointStore;

const GENERIC_FAILURE: &str = "Failed to delete trading account";

/// Outcome of a deletion request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// The remote store acknowledged the deletion.
    Deleted,
    /// The user declined the confirmation; nothing was sent.
    Cancelled,
}

/// Removes accounts from the remote store.
pub struct DeletionFlow {
    store: Arc<dyn AccountStore>,
    endpoints: Arc<EndpointStore>,
}

impl DeletionFlow {
    /// Flow writing through `store` at the endpoint held by `endpoints`.
    #[must_use]
    pub fn new(store: Arc<dyn AccountStore>, endpoints: Arc<EndpointStore>) -> Self {
        Self { store, endpoints }
    }

    /// Ask `confirm`, then delete `id`.
    ///
    /// Deleting an id the store no longer has succeeds when the store says so;
    /// a 404 answer is reported as a not-found write failure.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteWriteError`] when the store rejects or fails the call.
    pub async fn delete<F>(
        &self,
        id: &AccountId,
        confirm: F,
    ) -> Result<DeletionOutcome, RemoteWriteError>
    where
        F: FnOnce() -> bool,
    {
        if !confirm() {
            info!(account_id = %id, "deletion cancelled");
            return Ok(DeletionOutcome::Cancelled);
        }

        let endpoint = self.endpoints.endpoint().await;
        match self.store.delete_account(&endpoint, id).await {
            Ok(()) => {
                info!(account_id = %id, "trading account deleted");
                Ok(DeletionOutcome::Deleted)
            }
            Err(err) => {
                let failure = RemoteWriteError::from_remote(&err, GENERIC_FAILURE);
                warn!(
                    account_id = %id,
                    kind = %failure.kind,
                    error = %err,
                    "trading account deletion failed"
                );
                Err(failure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradedesk_config::Endpoint;
    use tradedesk_core::{RemoteError, WriteFailureKind};
    use tradedesk_test_support::fixtures::sample_accounts;
    use tradedesk_test_support::mocks::ScriptedStore;

    fn flow() -> (Arc<ScriptedStore>, DeletionFlow) {
        let store = Arc::new(ScriptedStore::with_accounts(sample_accounts()));
        let endpoints = Arc::new(EndpointStore::new(store.clone(), Endpoint::default()));
        (store.clone(), DeletionFlow::new(store, endpoints))
    }

    #[tokio::test]
    async fn declined_confirmation_sends_nothing() {
        let (store, flow) = flow();
        let outcome = flow
            .delete(&AccountId::new("a-1"), || false)
            .await
            .expect("cancel is not an error");
        assert_eq!(outcome, DeletionOutcome::Cancelled);
        assert!(store.calls().is_empty());
        assert_eq!(store.accounts().len(), 3);
    }

    #[tokio::test]
    async fn confirmed_deletion_removes_account() {
        let (store, flow) = flow();
        let outcome = flow
            .delete(&AccountId::new("a-2"), || true)
            .await
            .expect("deleted");
        assert_eq!(outcome, DeletionOutcome::Deleted);
        assert!(store.accounts().iter().all(|a| a.id.as_str() != "a-2"));
    }

    #[tokio::test]
    async fn unknown_id_is_idempotent_unless_store_reports_not_found() {
        let (store, flow) = flow();
        assert_eq!(
            flow.delete(&AccountId::new("gone"), || true).await,
            Ok(DeletionOutcome::Deleted)
        );

        store.set_unknown_delete_is_not_found(true);
        let err = flow
            .delete(&AccountId::new("gone"), || true)
            .await
            .expect_err("404");
        assert_eq!(err.kind, WriteFailureKind::NotFound);
        assert_eq!(err.message, "Account not found");
    }

    #[tokio::test]
    async fn transport_failure_uses_generic_message() {
        let (store, flow) = flow();
        store.fail_next_delete(RemoteError::Transport {
            operation: "delete_account",
            message: "connection reset".into(),
        });
        let err = flow
            .delete(&AccountId::new("a-1"), || true)
            .await
            .expect_err("transport");
        assert_eq!(err.kind, WriteFailureKind::Transport);
        assert_eq!(err.to_string(), "Failed to delete trading account");
        assert_eq!(store.accounts().len(), 3);
    }
}
