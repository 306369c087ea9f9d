//! Authoritative local snapshot of the current identity's trading accounts.
//!
//! # Design
//! - Every refresh takes a token from a monotonically increasing counter when
//!   it starts; only the most recently started refresh may commit.
//! - Commits swap an `Arc<AccountSnapshot>`; readers never observe a partially
//!   replaced listing and never receive a mutable alias.
//! - Clearing for an absent identity also consumes a token, so a listing still
//!   in flight for a previous identity cannot land afterwards.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use tradedesk_core::{AccountSnapshot, AccountStore, OwnerId, RemoteFetchError, TradingAccount};
use tradedesk_telemetry::mask_login;

use crate::endpoint::EndpointStore;

/// Outcome of a refresh that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The refresh was the latest one started and its snapshot is now current.
    Committed(Arc<AccountSnapshot>),
    /// A newer refresh started before this one finished; its result was discarded.
    Superseded,
}

impl RefreshOutcome {
    /// The committed snapshot, if this refresh won.
    #[must_use]
    pub fn snapshot(&self) -> Option<&Arc<AccountSnapshot>> {
        match self {
            Self::Committed(snapshot) => Some(snapshot),
            Self::Superseded => None,
        }
    }
}

/// Mirrors the remote account listing for one identity at a time.
pub struct AccountDirectory {
    store: Arc<dyn AccountStore>,
    endpoints: Arc<EndpointStore>,
    latest_token: AtomicU64,
    snapshot: RwLock<Arc<AccountSnapshot>>,
}

impl AccountDirectory {
    /// Empty directory reading through `store` at the endpoint held by `endpoints`.
    #[must_use]
    pub fn new(store: Arc<dyn AccountStore>, endpoints: Arc<EndpointStore>) -> Self {
        Self {
            store,
            endpoints,
            latest_token: AtomicU64::new(0),
            snapshot: RwLock::new(AccountSnapshot::shared_empty(0)),
        }
    }

    /// Current snapshot.
    pub async fn snapshot(&self) -> Arc<AccountSnapshot> {
        self.snapshot.read().await.clone()
    }

    /// Replace the snapshot with the remote listing for `identity`.
    ///
    /// An absent identity clears the snapshot without a remote call.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteFetchError`] when the listing fails and this refresh is
    /// still the latest; the snapshot is cleared in that case. Failures of
    /// superseded refreshes are reported as [`RefreshOutcome::Superseded`].
    pub async fn refresh(
        &self,
        identity: Option<&OwnerId>,
    ) -> Result<RefreshOutcome, RemoteFetchError> {
        let token = self.begin_refresh();
        self.refresh_with(token, identity).await
    }

    /// Reserve the token of a new refresh. Any later reservation supersedes it.
    ///
    /// Callers that read the identity under a lock take the token before
    /// releasing it, so the token order matches the order of identity changes.
    #[must_use]
    pub fn begin_refresh(&self) -> u64 {
        self.latest_token.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Run the refresh reserved by [`Self::begin_refresh`] for `identity`.
    ///
    /// A token that is already superseded returns without a remote call.
    ///
    /// # Errors
    ///
    /// Same as [`Self::refresh`].
    pub async fn refresh_with(
        &self,
        token: u64,
        identity: Option<&OwnerId>,
    ) -> Result<RefreshOutcome, RemoteFetchError> {
        if !self.is_latest(token) {
            debug!(token, "account refresh superseded before it started");
            return Ok(RefreshOutcome::Superseded);
        }

        let Some(owner) = identity else {
            let mut current = self.snapshot.write().await;
            if !self.is_latest(token) {
                return Ok(RefreshOutcome::Superseded);
            }
            let cleared = AccountSnapshot::shared_empty(token);
            *current = cleared.clone();
            debug!(token, "cleared account snapshot for absent identity");
            return Ok(RefreshOutcome::Committed(cleared));
        };

        let endpoint = self.endpoints.endpoint().await;
        debug!(token, owner = %owner, endpoint = %endpoint, "refreshing accounts");
        let listing = self.store.list_accounts(&endpoint, owner).await;

        let mut current = self.snapshot.write().await;
        if !self.is_latest(token) {
            warn!(
                token,
                latest = self.latest_token.load(Ordering::SeqCst),
                succeeded = listing.is_ok(),
                "discarding superseded account refresh"
            );
            return Ok(RefreshOutcome::Superseded);
        }

        match listing {
            Ok(rows) => {
                let snapshot = Arc::new(reconcile(token, owner, rows));
                *current = snapshot.clone();
                info!(token, accounts = snapshot.len(), "account snapshot committed");
                Ok(RefreshOutcome::Committed(snapshot))
            }
            Err(err) => {
                *current = AccountSnapshot::shared_empty(token);
                let err = RemoteFetchError::from_remote(err);
                warn!(token, error = %err, source = %err.source, "account refresh failed");
                Err(err)
            }
        }
    }

    fn is_latest(&self, token: u64) -> bool {
        self.latest_token.load(Ordering::SeqCst) == token
    }
}

/// Keep only `owner`'s rows, drop duplicate ids (first wins) and order newest first.
fn reconcile(version: u64, owner: &OwnerId, rows: Vec<TradingAccount>) -> AccountSnapshot {
    let mut seen = HashSet::new();
    let mut accounts = Vec::with_capacity(rows.len());
    for account in rows {
        if &account.owner_id != owner {
            warn!(
                account_id = %account.id,
                login = %mask_login(&account.login),
                "discarding account owned by another identity"
            );
            continue;
        }
        if !seen.insert(account.id.clone()) {
            warn!(account_id = %account.id, "discarding duplicate account row");
            continue;
        }
        accounts.push(account);
    }
    accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    AccountSnapshot { version, accounts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradedesk_config::Endpoint;
    use tradedesk_core::{AccountId, Plan, Platform, RemoteError};
    use tradedesk_test_support::fixtures::{DEMO_OWNER, account, demo_owner, sample_accounts};
    use tradedesk_test_support::mocks::ScriptedStore;

    fn setup(accounts: Vec<TradingAccount>) -> (Arc<ScriptedStore>, AccountDirectory) {
        let store = Arc::new(ScriptedStore::with_accounts(accounts));
        let endpoints = Arc::new(EndpointStore::new(store.clone(), Endpoint::default()));
        let directory = AccountDirectory::new(store.clone(), endpoints);
        (store, directory)
    }

    fn ids(snapshot: &AccountSnapshot) -> Vec<&str> {
        snapshot.accounts.iter().map(|a| a.id.as_str()).collect()
    }

    #[tokio::test]
    async fn refresh_orders_newest_first() {
        let (_, directory) = setup(sample_accounts());
        let outcome = directory.refresh(Some(&demo_owner())).await.expect("refresh");
        let snapshot = outcome.snapshot().expect("committed").clone();
        assert_eq!(ids(&snapshot), vec!["a-3", "a-2", "a-1"]);
        assert_eq!(snapshot.version, 1);
        assert_eq!(directory.snapshot().await, snapshot);
    }

    #[tokio::test]
    async fn foreign_and_duplicate_rows_are_dropped() {
        let (store, directory) = setup(sample_accounts());
        let mut duplicate = account("a-1", DEMO_OWNER, Platform::Etoro, Plan::Basic, 50);
        duplicate.login = "dup".into();
        store.inject_listing_rows(vec![
            account("z-9", "intruder", Platform::Fxcm, Plan::Pro, 40),
            duplicate,
        ]);

        let outcome = directory.refresh(Some(&demo_owner())).await.expect("refresh");
        let snapshot = outcome.snapshot().expect("committed");
        assert_eq!(ids(snapshot), vec!["a-3", "a-2", "a-1"]);
        let first = snapshot.get(&AccountId::new("a-1")).expect("kept");
        assert_eq!(first.platform, Platform::MetaTrader5);
    }

    #[test]
    fn equal_timestamps_keep_listing_order() {
        let rows = vec![
            account("t-1", DEMO_OWNER, Platform::Fxcm, Plan::Basic, 5),
            account("t-2", DEMO_OWNER, Platform::Fxcm, Plan::Basic, 5),
        ];
        let snapshot = reconcile(1, &demo_owner(), rows);
        assert_eq!(ids(&snapshot), vec!["t-1", "t-2"]);
    }

    #[tokio::test]
    async fn absent_identity_clears_without_remote_call() {
        let (store, directory) = setup(sample_accounts());
        directory.refresh(Some(&demo_owner())).await.expect("refresh");
        assert_eq!(directory.snapshot().await.len(), 3);

        let outcome = directory.refresh(None).await.expect("never fails");
        assert!(outcome.snapshot().expect("committed").is_empty());
        assert!(directory.snapshot().await.is_empty());
        assert_eq!(store.call_count("list_accounts"), 1);
    }

    #[tokio::test]
    async fn failure_clears_snapshot_and_surfaces_upstream_message() {
        let (store, directory) = setup(sample_accounts());
        directory.refresh(Some(&demo_owner())).await.expect("refresh");
        store.fail_next_list(RemoteError::Status {
            operation: "list_accounts",
            status: 500,
            message: Some("database offline".into()),
        });

        let err = directory
            .refresh(Some(&demo_owner()))
            .await
            .expect_err("fails");
        assert_eq!(err.message, "database offline");
        assert!(directory.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn failure_without_message_uses_generic_text() {
        let (store, directory) = setup(Vec::new());
        store.fail_next_list(RemoteError::Transport {
            operation: "list_accounts",
            message: "connection refused".into(),
        });
        let err = directory
            .refresh(Some(&demo_owner()))
            .await
            .expect_err("fails");
        assert_eq!(err.message, "Failed to load trading accounts");
    }

    #[tokio::test]
    async fn late_result_of_older_refresh_is_discarded() {
        let (store, directory) = setup(sample_accounts());
        let directory = Arc::new(directory);
        let gate = store.gate_next_list();

        let first = {
            let directory = directory.clone();
            tokio::spawn(async move { directory.refresh(Some(&demo_owner())).await })
        };
        gate.entered.await.expect("first refresh in flight");

        store.insert(account("a-4", DEMO_OWNER, Platform::Plus500, Plan::Basic, 4));
        let second = directory.refresh(Some(&demo_owner())).await.expect("second");
        assert_eq!(second.snapshot().expect("committed").len(), 4);

        gate.release.send(()).expect("release first");
        let first = first.await.expect("join").expect("first");
        assert_eq!(first, RefreshOutcome::Superseded);

        let current = directory.snapshot().await;
        assert_eq!(current.len(), 4);
        assert_eq!(current.version, 2);
    }

    #[tokio::test]
    async fn stale_failure_does_not_clear_newer_snapshot() {
        let (store, directory) = setup(sample_accounts());
        let directory = Arc::new(directory);
        store.fail_next_list(RemoteError::Transport {
            operation: "list_accounts",
            message: "timed out".into(),
        });
        let gate = store.gate_next_list();

        let first = {
            let directory = directory.clone();
            tokio::spawn(async move { directory.refresh(Some(&demo_owner())).await })
        };
        gate.entered.await.expect("first refresh in flight");
        directory.refresh(Some(&demo_owner())).await.expect("second");
        gate.release.send(()).expect("release first");

        assert_eq!(first.await.expect("join"), Ok(RefreshOutcome::Superseded));
        assert_eq!(directory.snapshot().await.len(), 3);
    }

    #[tokio::test]
    async fn superseded_reservation_skips_the_listing() {
        let (store, directory) = setup(sample_accounts());
        let stale = directory.begin_refresh();
        directory.refresh(None).await.expect("cleared");

        let outcome = directory
            .refresh_with(stale, Some(&demo_owner()))
            .await
            .expect("superseded");
        assert_eq!(outcome, RefreshOutcome::Superseded);
        assert_eq!(store.call_count("list_accounts"), 0);
        assert!(directory.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn sign_out_beats_in_flight_listing() {
        let (store, directory) = setup(sample_accounts());
        let directory = Arc::new(directory);
        let gate = store.gate_next_list();

        let pending = {
            let directory = directory.clone();
            tokio::spawn(async move { directory.refresh(Some(&demo_owner())).await })
        };
        gate.entered.await.expect("listing in flight");
        directory.refresh(None).await.expect("cleared");
        gate.release.send(()).expect("release");

        assert_eq!(pending.await.expect("join"), Ok(RefreshOutcome::Superseded));
        assert!(directory.snapshot().await.is_empty());
    }
}
