//! Remote account store contract implemented by transport adapters.

use async_trait::async_trait;
use tradedesk_config::Endpoint;

use crate::error::RemoteResult;
use crate::model::{
    AccountId, BillingPeriod, HealthReport, NewAccount, OwnerId, PromoRedemption,
    SubscriptionReceipt, TradingAccount,
};

/// Remote store holding trading accounts and billing state.
///
/// Every call targets an explicit endpoint so the caller decides which base
/// URL is authoritative at the time of the call.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Liveness check against `GET /health`.
    async fn health(&self, endpoint: &Endpoint) -> RemoteResult<HealthReport>;

    /// List the accounts owned by `owner`.
    async fn list_accounts(
        &self,
        endpoint: &Endpoint,
        owner: &OwnerId,
    ) -> RemoteResult<Vec<TradingAccount>>;

    /// Register a new account; returns the stored record when the server echoes it.
    async fn register_account(
        &self,
        endpoint: &Endpoint,
        account: &NewAccount,
    ) -> RemoteResult<Option<TradingAccount>>;

    /// Delete an account by identifier.
    async fn delete_account(&self, endpoint: &Endpoint, id: &AccountId) -> RemoteResult<()>;

    /// Activate a subscription for `owner` over `period`.
    async fn subscribe(
        &self,
        endpoint: &Endpoint,
        owner: &OwnerId,
        period: BillingPeriod,
    ) -> RemoteResult<SubscriptionReceipt>;

    /// Redeem a promo code on behalf of `owner`.
    async fn redeem(
        &self,
        endpoint: &Endpoint,
        owner: &OwnerId,
        code: &str,
    ) -> RemoteResult<PromoRedemption>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;

    struct StubStore;

    #[async_trait]
    impl AccountStore for StubStore {
        async fn health(&self, _endpoint: &Endpoint) -> RemoteResult<HealthReport> {
            Ok(HealthReport::default())
        }

        async fn list_accounts(
            &self,
            _endpoint: &Endpoint,
            _owner: &OwnerId,
        ) -> RemoteResult<Vec<TradingAccount>> {
            Ok(Vec::new())
        }

        async fn register_account(
            &self,
            _endpoint: &Endpoint,
            _account: &NewAccount,
        ) -> RemoteResult<Option<TradingAccount>> {
            Ok(None)
        }

        async fn delete_account(&self, _endpoint: &Endpoint, _id: &AccountId) -> RemoteResult<()> {
            Ok(())
        }

        async fn subscribe(
            &self,
            _endpoint: &Endpoint,
            owner: &OwnerId,
            period: BillingPeriod,
        ) -> RemoteResult<SubscriptionReceipt> {
            Ok(SubscriptionReceipt {
                active_until: format!("{owner}:{}", period.as_str()),
            })
        }

        async fn redeem(
            &self,
            _endpoint: &Endpoint,
            _owner: &OwnerId,
            code: &str,
        ) -> RemoteResult<PromoRedemption> {
            if code == "EXPIRED" {
                return Err(RemoteError::Status {
                    operation: "redeem",
                    status: 400,
                    message: Some("Code expired".into()),
                });
            }
            Ok(PromoRedemption {
                discount_percent: 20.0,
                days: 30,
            })
        }
    }

    #[tokio::test]
    async fn billing_calls_dispatch_through_trait_objects() {
        let store: Box<dyn AccountStore> = Box::new(StubStore);
        let endpoint = Endpoint::default();
        let owner = OwnerId::new("demo_user");

        let receipt = store
            .subscribe(&endpoint, &owner, BillingPeriod::Yearly)
            .await
            .expect("subscribe");
        assert_eq!(receipt.active_until, "demo_user:yearly");

        let redemption = store
            .redeem(&endpoint, &owner, "WELCOME")
            .await
            .expect("redeem");
        assert_eq!(redemption.days, 30);

        let err = store
            .redeem(&endpoint, &owner, "EXPIRED")
            .await
            .expect_err("expired code is rejected");
        assert_eq!(err.upstream_message(), Some("Code expired"));
    }

    #[tokio::test]
    async fn required_methods_are_usable_through_trait_objects() {
        let store: Box<dyn AccountStore> = Box::new(StubStore);
        let endpoint = Endpoint::default();
        assert!(store.health(&endpoint).await.is_ok());
        assert!(
            store
                .list_accounts(&endpoint, &OwnerId::new("demo_user"))
                .await
                .expect("list")
                .is_empty()
        );
    }
}
