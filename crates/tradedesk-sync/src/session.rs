//! Session façade tying identity, endpoint, directory and write flows together.
//!
//! Writes never splice into the snapshot; every successful write is followed
//! by a full directory refresh whose outcome is returned alongside.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;
use tradedesk_config::{ConfigError, Endpoint};
use tradedesk_core::{
    AccountId, AccountSnapshot, AccountStore, BillingPeriod, OwnerId, PromoRedemption,
    RemoteFetchError, RemoteWriteError,
};

use crate::billing::{BillingFlow, Subscription};
use crate::connectivity::{Connectivity, ProbeOutcome};
use crate::dashboard::{DashboardStats, SessionStatus, aggregate};
use crate::deletion::{DeletionFlow, DeletionOutcome};
use crate::directory::{AccountDirectory, RefreshOutcome};
use crate::endpoint::{EndpointCommit, EndpointStore};
use crate::error::{EndpointError, FlowError};
use crate::registration::{RegistrationFlow, RegistrationForm, RegistrationReceipt};

/// Outcome of a write together with the refresh it triggered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synced<T> {
    /// Result of the write itself.
    pub value: T,
    /// Directory refresh run after the write; `None` when none was needed.
    pub refresh: Option<Result<RefreshOutcome, RemoteFetchError>>,
}

/// Client-side session over one remote account service.
pub struct Session {
    identity: RwLock<Option<OwnerId>>,
    endpoints: Arc<EndpointStore>,
    directory: AccountDirectory,
    registration: RegistrationFlow,
    deletion: DeletionFlow,
    billing: BillingFlow,
}

impl Session {
    /// Signed-out session talking to `store` at `endpoint`.
    #[must_use]
    pub fn new(store: Arc<dyn AccountStore>, endpoint: Endpoint) -> Self {
        Self::with_identity(store, endpoint, None)
    }

    /// Session already signed in as `identity`.
    ///
    /// The directory stays empty until the first [`Session::refresh`].
    #[must_use]
    pub fn with_identity(
        store: Arc<dyn AccountStore>,
        endpoint: Endpoint,
        identity: Option<OwnerId>,
    ) -> Self {
        let endpoints = Arc::new(EndpointStore::new(store.clone(), endpoint));
        Self {
            identity: RwLock::new(identity),
            directory: AccountDirectory::new(store.clone(), endpoints.clone()),
            registration: RegistrationFlow::new(store.clone(), endpoints.clone()),
            deletion: DeletionFlow::new(store.clone(), endpoints.clone()),
            billing: BillingFlow::new(store, endpoints.clone()),
            endpoints,
        }
    }

    /// Current identity.
    pub async fn identity(&self) -> Option<OwnerId> {
        self.identity.read().await.clone()
    }

    /// Whether an identity is present.
    pub async fn status(&self) -> SessionStatus {
        SessionStatus::for_identity(self.identity.read().await.as_ref())
    }

    /// Switch identity and reload the directory for it.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteFetchError`] when the listing for the new identity fails.
    pub async fn set_identity(
        &self,
        identity: Option<OwnerId>,
    ) -> Result<RefreshOutcome, RemoteFetchError> {
        {
            let mut current = self.identity.write().await;
            info!(
                signed_in = identity.is_some(),
                changed = *current != identity,
                "session identity updated"
            );
            *current = identity;
        }
        self.refresh().await
    }

    /// Reload the directory for the current identity.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteFetchError`] when the listing fails.
    pub async fn refresh(&self) -> Result<RefreshOutcome, RemoteFetchError> {
        // The token is reserved under the identity lock so a concurrent
        // `set_identity` always issues a later one.
        let (token, identity) = {
            let identity = self.identity.read().await;
            (self.directory.begin_refresh(), identity.clone())
        };
        self.directory.refresh_with(token, identity.as_ref()).await
    }

    /// Current account snapshot.
    pub async fn snapshot(&self) -> Arc<AccountSnapshot> {
        self.directory.snapshot().await
    }

    /// Dashboard figures for the current snapshot.
    pub async fn stats(&self) -> DashboardStats {
        aggregate(&self.snapshot().await.accounts)
    }

    /// Committed endpoint.
    pub async fn endpoint(&self) -> Endpoint {
        self.endpoints.endpoint().await
    }

    /// Last known connectivity of the committed endpoint.
    pub async fn connectivity(&self) -> Connectivity {
        self.endpoints.connectivity().await
    }

    /// Re-probe the committed endpoint.
    pub async fn refresh_connectivity(&self) -> Connectivity {
        self.endpoints.refresh_connectivity().await
    }

    /// Probe a candidate endpoint without committing it.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the input is not a usable endpoint.
    pub async fn test_endpoint(
        &self,
        raw: &str,
    ) -> Result<(Endpoint, ProbeOutcome), ConfigError> {
        self.endpoints.test_endpoint(raw).await
    }

    /// Verify and commit a new endpoint, then reload the directory from it.
    ///
    /// # Errors
    ///
    /// Returns an [`EndpointError`] when the candidate is unusable or offline;
    /// nothing is refreshed in that case.
    pub async fn set_endpoint(
        &self,
        raw: &str,
    ) -> Result<Synced<EndpointCommit>, EndpointError> {
        let commit = self.endpoints.set_endpoint(raw).await?;
        Ok(Synced {
            value: commit,
            refresh: Some(self.refresh().await),
        })
    }

    /// Register a new account for the current identity.
    ///
    /// # Errors
    ///
    /// Returns a [`FlowError`] when validation or the remote write fails.
    pub async fn register(
        &self,
        form: &RegistrationForm,
    ) -> Result<Synced<RegistrationReceipt>, FlowError> {
        let identity = self.identity().await;
        let receipt = self.registration.register(identity.as_ref(), form).await?;
        Ok(Synced {
            value: receipt,
            refresh: Some(self.refresh().await),
        })
    }

    /// Delete `id` after `confirm` agrees.
    ///
    /// A cancelled deletion does not refresh.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteWriteError`] when the remote deletion fails.
    pub async fn delete<F>(
        &self,
        id: &AccountId,
        confirm: F,
    ) -> Result<Synced<DeletionOutcome>, RemoteWriteError>
    where
        F: FnOnce() -> bool,
    {
        let outcome = self.deletion.delete(id, confirm).await?;
        let refresh = match outcome {
            DeletionOutcome::Deleted => Some(self.refresh().await),
            DeletionOutcome::Cancelled => None,
        };
        Ok(Synced {
            value: outcome,
            refresh,
        })
    }

    /// Subscribe the current identity to the `tier_id` tier.
    ///
    /// # Errors
    ///
    /// Returns a [`FlowError`] when signed out, for an unknown tier, or when
    /// the remote refuses.
    pub async fn subscribe(
        &self,
        tier_id: &str,
        period: BillingPeriod,
    ) -> Result<Subscription, FlowError> {
        let identity = self.identity().await;
        self.billing.subscribe(identity.as_ref(), tier_id, period).await
    }

    /// Redeem a promo code for the current identity.
    ///
    /// # Errors
    ///
    /// Returns a [`FlowError`] for a blank code, when signed out, or when the
    /// remote rejects the code.
    pub async fn redeem(&self, code: &str) -> Result<PromoRedemption, FlowError> {
        let identity = self.identity().await;
        self.billing.redeem(identity.as_ref(), code).await
    }
}
