//! `reqwest` implementation of [`AccountStore`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use tradedesk_config::{ClientSettings, Endpoint};
use tradedesk_core::{
    AccountId, AccountStore, BillingPeriod, HealthReport, NewAccount, OwnerId, PromoRedemption,
    RemoteError, RemoteResult, SubscriptionReceipt, TradingAccount,
};
use tradedesk_telemetry::{mask_login, redact_secret};
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};
use crate::wire::{
    AccountRow, ErrorBody, HealthBody, ListBody, RedeemBody, RedeemResponse, RegisterBody,
    SubscribeBody, SubscribeResponse, scalar_text,
};

/// Header carrying the per-request identifier.
pub const HEADER_REQUEST_ID: &str = "x-request-id";

/// Account store backed by the remote HTTP service.
#[derive(Debug, Clone)]
pub struct HttpAccountStore {
    client: Client,
}

impl HttpAccountStore {
    /// Build a store using the timeout from `settings`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the HTTP client cannot be constructed.
    pub fn from_settings(settings: &ClientSettings) -> ClientResult<Self> {
        Self::with_timeout(settings.http_timeout)
    }

    /// Build a store whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the HTTP client cannot be constructed.
    pub fn with_timeout(timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ClientError::Build { source })?;

        Ok(Self { client })
    }

    async fn send(operation: &'static str, request: RequestBuilder) -> RemoteResult<Response> {
        let response = with_request_id(operation, request)
            .send()
            .await
            .map_err(|err| transport(operation, &err))?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(classify_failure(operation, response).await)
        }
    }
}

/// Tag `request` with a freshly generated request identifier.
fn with_request_id(operation: &'static str, request: RequestBuilder) -> RequestBuilder {
    let request_id = Uuid::new_v4().to_string();
    debug!(operation, request_id = %request_id, "sending request");
    request.header(HEADER_REQUEST_ID, request_id)
}

fn transport(operation: &'static str, err: &reqwest::Error) -> RemoteError {
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };
    RemoteError::Transport { operation, message }
}

async fn classify_failure(operation: &'static str, response: Response) -> RemoteError {
    let status = response.status().as_u16();
    let bytes = response.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ErrorBody>(&bytes)
        .ok()
        .and_then(|body| body.error)
        .filter(|message| !message.trim().is_empty());
    RemoteError::Status {
        operation,
        status,
        message,
    }
}

async fn read_body(operation: &'static str, response: Response) -> RemoteResult<Vec<u8>> {
    response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|err| transport(operation, &err))
}

async fn decode<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> RemoteResult<T> {
    let bytes = read_body(operation, response).await?;
    serde_json::from_slice(&bytes).map_err(|err| RemoteError::Malformed {
        operation,
        message: err.to_string(),
    })
}

fn account_url(endpoint: &Endpoint, id: &AccountId) -> RemoteResult<Url> {
    let mut url = Url::parse(&endpoint.join("/accounts")).map_err(|err| RemoteError::Transport {
        operation: "delete_account",
        message: format!("invalid endpoint: {err}"),
    })?;
    url.path_segments_mut()
        .map_err(|()| RemoteError::Transport {
            operation: "delete_account",
            message: "endpoint cannot carry a path".to_string(),
        })?
        .push(id.as_str());
    Ok(url)
}

#[async_trait]
impl AccountStore for HttpAccountStore {
    async fn health(&self, endpoint: &Endpoint) -> RemoteResult<HealthReport> {
        const OPERATION: &str = "health";
        debug!(endpoint = %endpoint, "probing account service");
        let response = Self::send(OPERATION, self.client.get(endpoint.join("/health"))).await?;
        let bytes = read_body(OPERATION, response).await?;
        let body = serde_json::from_slice::<HealthBody>(&bytes).unwrap_or_default();
        Ok(HealthReport {
            platform: body.platform.filter(|platform| !platform.trim().is_empty()),
        })
    }

    async fn list_accounts(
        &self,
        endpoint: &Endpoint,
        owner: &OwnerId,
    ) -> RemoteResult<Vec<TradingAccount>> {
        const OPERATION: &str = "list_accounts";
        debug!(endpoint = %endpoint, owner = %owner, "listing trading accounts");
        let request = self
            .client
            .get(endpoint.join("/accounts"))
            .query(&[("user_id", owner.as_str())]);
        let response = Self::send(OPERATION, request).await?;
        let body: ListBody = decode(OPERATION, response).await?;

        let mut accounts = Vec::new();
        for value in body.into_rows() {
            let converted = serde_json::from_value::<AccountRow>(value)
                .map_err(|err| err.to_string())
                .and_then(|row| row.into_account(Some(owner)));
            match converted {
                Ok(account) => accounts.push(account),
                Err(reason) => {
                    warn!(owner = %owner, reason = %reason, "skipping malformed account row");
                }
            }
        }
        Ok(accounts)
    }

    async fn register_account(
        &self,
        endpoint: &Endpoint,
        account: &NewAccount,
    ) -> RemoteResult<Option<TradingAccount>> {
        const OPERATION: &str = "register_account";
        debug!(
            endpoint = %endpoint,
            login = %mask_login(&account.login),
            secret = redact_secret(account.secret.expose()),
            platform = %account.platform,
            "registering trading account"
        );
        let request = self
            .client
            .post(endpoint.join("/register"))
            .json(&RegisterBody::from(account));
        let response = Self::send(OPERATION, request).await?;
        let bytes = read_body(OPERATION, response).await?;

        let echoed = match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(mut map)) if !map.is_empty() => {
                let record = map.remove("account").unwrap_or(Value::Object(map));
                serde_json::from_value::<AccountRow>(record)
                    .map_err(|err| err.to_string())
                    .and_then(|row| row.into_account(Some(&account.owner_id)))
                    .map_err(|reason| {
                        debug!(reason = %reason, "registration response is not an account record");
                    })
                    .ok()
            }
            _ => None,
        };
        Ok(echoed)
    }

    async fn delete_account(&self, endpoint: &Endpoint, id: &AccountId) -> RemoteResult<()> {
        const OPERATION: &str = "delete_account";
        debug!(endpoint = %endpoint, account_id = %id, "deleting trading account");
        let url = account_url(endpoint, id)?;
        Self::send(OPERATION, self.client.delete(url)).await?;
        Ok(())
    }

    async fn subscribe(
        &self,
        endpoint: &Endpoint,
        owner: &OwnerId,
        period: BillingPeriod,
    ) -> RemoteResult<SubscriptionReceipt> {
        const OPERATION: &str = "subscribe";
        debug!(endpoint = %endpoint, owner = %owner, period = period.as_str(), "subscribing");
        let request = self.client.post(endpoint.join("/subscribe")).json(&SubscribeBody {
            user_id: owner.as_str(),
            plan: period,
        });
        let response = Self::send(OPERATION, request).await?;
        let body: SubscribeResponse = decode(OPERATION, response).await?;
        let active_until = scalar_text(&body.active_until).ok_or_else(|| RemoteError::Malformed {
            operation: OPERATION,
            message: "active_until is not a string".to_string(),
        })?;
        Ok(SubscriptionReceipt { active_until })
    }

    async fn redeem(
        &self,
        endpoint: &Endpoint,
        owner: &OwnerId,
        code: &str,
    ) -> RemoteResult<PromoRedemption> {
        const OPERATION: &str = "redeem";
        debug!(endpoint = %endpoint, owner = %owner, "redeeming promo code");
        let request = self
            .client
            .post(endpoint.join("/redeem"))
            .json(&RedeemBody {
                user_id: owner.as_str(),
                code,
            });
        let response = Self::send(OPERATION, request).await?;
        let body: RedeemResponse = decode(OPERATION, response).await?;
        Ok(PromoRedemption {
            discount_percent: body.discount_percent,
            days: body.days,
        })
    }
}
