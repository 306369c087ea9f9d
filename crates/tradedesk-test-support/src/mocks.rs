//! Scripted in-memory account store.
//!
//! Behaves like a well-mannered remote service by default and lets tests
//! inject failures, foreign rows and completion-order gates.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::oneshot;
use tradedesk_config::Endpoint;
use tradedesk_core::{
    AccountId, AccountStore, BillingPeriod, HealthReport, NewAccount, OwnerId, PromoRedemption,
    RemoteError, RemoteResult, SubscriptionReceipt, TradingAccount,
};
use uuid::Uuid;

use crate::fixtures::epoch;

/// Remote call observed by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Operation name (`health`, `list_accounts`, `register_account`, ...).
    pub operation: &'static str,
    /// Endpoint the call targeted.
    pub endpoint: String,
    /// Owner, account id or login involved, when any.
    pub subject: Option<String>,
}

/// Scripted answer for health checks against one endpoint.
#[derive(Debug, Clone)]
pub enum HealthScript {
    /// Respond successfully with an optional platform label.
    Online(Option<String>),
    /// Fail with the given error.
    Offline(RemoteError),
}

/// Test-side handle for a gated call.
#[derive(Debug)]
pub struct GateHandle {
    /// Resolves once the gated call has captured its result and is waiting.
    pub entered: oneshot::Receiver<()>,
    /// Send to let the gated call complete.
    pub release: oneshot::Sender<()>,
}

#[derive(Debug)]
struct Gate {
    entered: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

impl Gate {
    fn pair() -> (Self, GateHandle) {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        (
            Self {
                entered: entered_tx,
                release: release_rx,
            },
            GateHandle {
                entered: entered_rx,
                release: release_tx,
            },
        )
    }

    async fn pass(self) {
        let _ = self.entered.send(());
        let _ = self.release.await;
    }
}

#[derive(Debug)]
struct State {
    accounts: Vec<TradingAccount>,
    created: i64,
    default_health: HealthScript,
    health: HashMap<String, HealthScript>,
    health_gates: VecDeque<Gate>,
    list_gates: VecDeque<Gate>,
    list_failures: VecDeque<RemoteError>,
    injected_rows: Vec<TradingAccount>,
    register_failures: VecDeque<RemoteError>,
    delete_failures: VecDeque<RemoteError>,
    echo_register: bool,
    unknown_delete_is_not_found: bool,
    subscription: RemoteResult<SubscriptionReceipt>,
    redemption: RemoteResult<PromoRedemption>,
    calls: Vec<RecordedCall>,
}

/// In-memory [`AccountStore`] with scripted behaviour.
#[derive(Debug)]
pub struct ScriptedStore {
    state: Mutex<State>,
}

impl Default for ScriptedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedStore {
    /// Empty store that echoes registrations and reports every endpoint online.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                accounts: Vec::new(),
                created: 0,
                default_health: HealthScript::Online(Some("MetaTrader".to_string())),
                health: HashMap::new(),
                health_gates: VecDeque::new(),
                list_gates: VecDeque::new(),
                list_failures: VecDeque::new(),
                injected_rows: Vec::new(),
                register_failures: VecDeque::new(),
                delete_failures: VecDeque::new(),
                echo_register: true,
                unknown_delete_is_not_found: false,
                subscription: Ok(SubscriptionReceipt {
                    active_until: "2025-07-01".to_string(),
                }),
                redemption: Ok(PromoRedemption {
                    discount_percent: 20.0,
                    days: 30,
                }),
                calls: Vec::new(),
            }),
        }
    }

    /// Store pre-populated with `accounts`.
    #[must_use]
    pub fn with_accounts(accounts: Vec<TradingAccount>) -> Self {
        let store = Self::new();
        store.lock().accounts = accounts;
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("scripted store lock poisoned")
    }

    /// Accounts currently held, in insertion order.
    #[must_use]
    pub fn accounts(&self) -> Vec<TradingAccount> {
        self.lock().accounts.clone()
    }

    /// Insert an account directly, bypassing registration.
    pub fn insert(&self, account: TradingAccount) {
        self.lock().accounts.push(account);
    }

    /// Every remote call observed so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Number of calls made for `operation`.
    #[must_use]
    pub fn call_count(&self, operation: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    /// Script the health answer for one endpoint.
    pub fn set_health(&self, endpoint: &str, script: HealthScript) {
        self.lock().health.insert(endpoint.to_string(), script);
    }

    /// Script the health answer for endpoints without a specific script.
    pub fn set_default_health(&self, script: HealthScript) {
        self.lock().default_health = script;
    }

    /// Hold the next health check until the returned handle releases it.
    #[must_use]
    pub fn gate_next_health(&self) -> GateHandle {
        let (gate, handle) = Gate::pair();
        self.lock().health_gates.push_back(gate);
        handle
    }

    /// Hold the next listing until the returned handle releases it.
    ///
    /// The listing captures its rows before waiting, so later writes are not
    /// visible in the gated result.
    #[must_use]
    pub fn gate_next_list(&self) -> GateHandle {
        let (gate, handle) = Gate::pair();
        self.lock().list_gates.push_back(gate);
        handle
    }

    /// Fail the next listing with `err`.
    pub fn fail_next_list(&self, err: RemoteError) {
        self.lock().list_failures.push_back(err);
    }

    /// Rows appended verbatim to every listing, regardless of owner.
    pub fn inject_listing_rows(&self, rows: Vec<TradingAccount>) {
        self.lock().injected_rows.extend(rows);
    }

    /// Fail the next registration with `err`.
    pub fn fail_next_register(&self, err: RemoteError) {
        self.lock().register_failures.push_back(err);
    }

    /// Fail the next deletion with `err`.
    pub fn fail_next_delete(&self, err: RemoteError) {
        self.lock().delete_failures.push_back(err);
    }

    /// Whether registrations answer with the stored record (`true`) or an empty ack.
    pub fn set_echo_register(&self, echo: bool) {
        self.lock().echo_register = echo;
    }

    /// Whether deleting an unknown id answers 404 instead of success.
    pub fn set_unknown_delete_is_not_found(&self, not_found: bool) {
        self.lock().unknown_delete_is_not_found = not_found;
    }

    /// Script the subscribe answer.
    pub fn set_subscription(&self, result: RemoteResult<SubscriptionReceipt>) {
        self.lock().subscription = result;
    }

    /// Script the redeem answer.
    pub fn set_redemption(&self, result: RemoteResult<PromoRedemption>) {
        self.lock().redemption = result;
    }
}

fn record(
    state: &mut State,
    operation: &'static str,
    endpoint: &Endpoint,
    subject: Option<String>,
) {
    state.calls.push(RecordedCall {
        operation,
        endpoint: endpoint.as_str().to_string(),
        subject,
    });
}

#[async_trait]
impl AccountStore for ScriptedStore {
    async fn health(&self, endpoint: &Endpoint) -> RemoteResult<HealthReport> {
        let (script, gate) = {
            let mut state = self.lock();
            record(&mut state, "health", endpoint, None);
            let script = state
                .health
                .get(endpoint.as_str())
                .cloned()
                .unwrap_or_else(|| state.default_health.clone());
            (script, state.health_gates.pop_front())
        };
        if let Some(gate) = gate {
            gate.pass().await;
        }
        match script {
            HealthScript::Online(platform) => Ok(HealthReport { platform }),
            HealthScript::Offline(err) => Err(err),
        }
    }

    async fn list_accounts(
        &self,
        endpoint: &Endpoint,
        owner: &OwnerId,
    ) -> RemoteResult<Vec<TradingAccount>> {
        let (result, gate) = {
            let mut state = self.lock();
            record(&mut state, "list_accounts", endpoint, Some(owner.to_string()));
            let result = state.list_failures.pop_front().map_or_else(
                || {
                    let mut rows: Vec<TradingAccount> = state
                        .accounts
                        .iter()
                        .filter(|account| &account.owner_id == owner)
                        .cloned()
                        .collect();
                    rows.extend(state.injected_rows.iter().cloned());
                    Ok(rows)
                },
                Err,
            );
            (result, state.list_gates.pop_front())
        };
        if let Some(gate) = gate {
            gate.pass().await;
        }
        result
    }

    async fn register_account(
        &self,
        endpoint: &Endpoint,
        account: &NewAccount,
    ) -> RemoteResult<Option<TradingAccount>> {
        let mut state = self.lock();
        record(&mut state, "register_account", endpoint, Some(account.login.clone()));
        if let Some(err) = state.register_failures.pop_front() {
            return Err(err);
        }

        state.created += 1;
        let record = TradingAccount {
            id: AccountId::new(Uuid::new_v4().to_string()),
            owner_id: account.owner_id.clone(),
            platform: account.platform.clone(),
            login: account.login.clone(),
            server: account.server.clone(),
            plan: account.plan.clone(),
            nickname: Some(account.nickname.clone()),
            secret_hint: Some(account.secret.hint()),
            created_at: epoch() + Duration::hours(24) + Duration::seconds(state.created),
        };
        state.accounts.push(record.clone());
        Ok(state.echo_register.then_some(record))
    }

    async fn delete_account(&self, endpoint: &Endpoint, id: &AccountId) -> RemoteResult<()> {
        let mut state = self.lock();
        record(&mut state, "delete_account", endpoint, Some(id.to_string()));
        if let Some(err) = state.delete_failures.pop_front() {
            return Err(err);
        }

        let before = state.accounts.len();
        state.accounts.retain(|account| &account.id != id);
        if state.accounts.len() == before && state.unknown_delete_is_not_found {
            return Err(RemoteError::Status {
                operation: "delete_account",
                status: 404,
                message: Some("Account not found".to_string()),
            });
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        endpoint: &Endpoint,
        owner: &OwnerId,
        period: BillingPeriod,
    ) -> RemoteResult<SubscriptionReceipt> {
        let mut state = self.lock();
        record(
            &mut state,
            "subscribe",
            endpoint,
            Some(format!("{owner}:{}", period.as_str())),
        );
        state.subscription.clone()
    }

    async fn redeem(
        &self,
        endpoint: &Endpoint,
        owner: &OwnerId,
        code: &str,
    ) -> RemoteResult<PromoRedemption> {
        let mut state = self.lock();
        record(&mut state, "redeem", endpoint, Some(format!("{owner}:{code}")));
        state.redemption.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{DEMO_OWNER, demo_owner, sample_accounts};
    use tradedesk_core::{Plan, Platform, Secret};

    fn new_account() -> NewAccount {
        NewAccount {
            owner_id: demo_owner(),
            platform: Platform::MetaTrader5,
            login: "12345".into(),
            secret: Secret::new("abcdef123"),
            server: "mt5.broker.com".into(),
            plan: Plan::Pro,
            nickname: "MetaTrader 5 Account".into(),
        }
    }

    #[tokio::test]
    async fn listing_filters_by_owner_and_appends_injected_rows() {
        let mut accounts = sample_accounts();
        accounts.push(crate::fixtures::account(
            "x-1",
            "someone_else",
            Platform::Fxcm,
            Plan::Basic,
            9,
        ));
        let store = ScriptedStore::with_accounts(accounts);
        let endpoint = Endpoint::default();

        let rows = store
            .list_accounts(&endpoint, &demo_owner())
            .await
            .expect("listing");
        assert_eq!(rows.len(), 3);

        store.inject_listing_rows(vec![crate::fixtures::account(
            "x-2",
            "intruder",
            Platform::Etoro,
            Plan::Basic,
            10,
        )]);
        let rows = store
            .list_accounts(&endpoint, &demo_owner())
            .await
            .expect("listing");
        assert_eq!(rows.len(), 4);
        assert_eq!(store.call_count("list_accounts"), 2);
        assert_eq!(store.calls()[0].subject.as_deref(), Some(DEMO_OWNER));
    }

    #[tokio::test]
    async fn register_echo_toggle_controls_response() {
        let store = ScriptedStore::new();
        let endpoint = Endpoint::default();
        let echoed = store
            .register_account(&endpoint, &new_account())
            .await
            .expect("register");
        assert!(echoed.is_some());

        store.set_echo_register(false);
        let acked = store
            .register_account(&endpoint, &new_account())
            .await
            .expect("register");
        assert!(acked.is_none());
        assert_eq!(store.accounts().len(), 2);
    }

    #[tokio::test]
    async fn delete_unknown_id_can_report_not_found() {
        let store = ScriptedStore::new();
        let endpoint = Endpoint::default();
        assert!(store.delete_account(&endpoint, &AccountId::new("nope")).await.is_ok());

        store.set_unknown_delete_is_not_found(true);
        let err = store
            .delete_account(&endpoint, &AccountId::new("nope"))
            .await
            .expect_err("404");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn gated_listing_waits_for_release() {
        let store = std::sync::Arc::new(ScriptedStore::with_accounts(sample_accounts()));
        let gate = store.gate_next_list();
        let task = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .list_accounts(&Endpoint::default(), &demo_owner())
                    .await
            })
        };
        gate.entered.await.expect("listing entered gate");
        assert!(!task.is_finished());
        gate.release.send(()).expect("release");
        let rows = task.await.expect("join").expect("listing");
        assert_eq!(rows.len(), 3);
    }
}
