//! Request and response bodies exchanged with the remote account service.
//!
//! Listing rows are decoded leniently: the service has shipped with both
//! `trading_platform` and `platform`/`broker` columns, logins as strings or
//! numbers, and several timestamp renderings.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tradedesk_core::{
    AccountId, BillingPeriod, NewAccount, OwnerId, Plan, Platform, TradingAccount,
};

/// Error body returned on non-success responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub(crate) error: Option<String>,
}

/// `GET /health` success body.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct HealthBody {
    #[serde(default)]
    pub(crate) platform: Option<String>,
}

/// `GET /accounts` success body.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListBody {
    Wrapped { accounts: Vec<Value> },
    Bare(Vec<Value>),
}

impl ListBody {
    pub(crate) fn into_rows(self) -> Vec<Value> {
        match self {
            Self::Wrapped { accounts } | Self::Bare(accounts) => accounts,
        }
    }
}

/// One account row as returned by the service.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AccountRow {
    #[serde(default)]
    id: Option<AccountId>,
    #[serde(default)]
    user_id: Option<OwnerId>,
    #[serde(default)]
    trading_platform: Option<String>,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default)]
    broker: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    login: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    account_number: Option<String>,
    #[serde(default)]
    server: Option<String>,
    #[serde(default)]
    plan: Option<String>,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    secret_hint: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

impl AccountRow {
    /// Convert into the domain record; rows without an owner are attributed to `owner`.
    pub(crate) fn into_account(self, owner: Option<&OwnerId>) -> Result<TradingAccount, String> {
        let id = self.id.ok_or("missing id")?;
        let owner_id = self
            .user_id
            .or_else(|| owner.cloned())
            .ok_or("missing user_id")?;
        let platform = [self.trading_platform, self.platform, self.broker]
            .into_iter()
            .flatten()
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .ok_or("missing trading_platform")?;
        let login = self
            .login
            .or(self.account_number)
            .filter(|value| !value.trim().is_empty())
            .ok_or("missing login")?;
        let created_at = self
            .created_at
            .as_deref()
            .ok_or("missing created_at")
            .and_then(|raw| parse_timestamp(raw).ok_or("unrecognised created_at"))?;

        Ok(TradingAccount {
            id,
            owner_id,
            platform: Platform::from_wire(&platform),
            login,
            server: self.server.unwrap_or_default(),
            plan: self
                .plan
                .as_deref()
                .map_or_else(Plan::default, Plan::from_wire),
            nickname: self.nickname.filter(|value| !value.trim().is_empty()),
            secret_hint: self.secret_hint,
            created_at,
        })
    }
}

/// `POST /register` request body.
///
/// Both `login`/`account_number` and `platform`/`broker` are sent so either
/// flavour of the service accepts the request.
#[derive(Debug, Serialize)]
pub(crate) struct RegisterBody<'a> {
    user_id: &'a str,
    login: &'a str,
    account_number: &'a str,
    platform: &'a str,
    broker: &'a str,
    server: &'a str,
    password: &'a str,
    plan: &'a str,
    nickname: &'a str,
}

impl<'a> From<&'a NewAccount> for RegisterBody<'a> {
    fn from(account: &'a NewAccount) -> Self {
        Self {
            user_id: account.owner_id.as_str(),
            login: &account.login,
            account_number: &account.login,
            platform: account.platform.label(),
            broker: account.platform.label(),
            server: &account.server,
            password: account.secret.expose(),
            plan: account.plan.as_str(),
            nickname: &account.nickname,
        }
    }
}

/// `POST /subscribe` request body.
#[derive(Debug, Serialize)]
pub(crate) struct SubscribeBody<'a> {
    pub(crate) user_id: &'a str,
    pub(crate) plan: BillingPeriod,
}

/// `POST /subscribe` success body.
#[derive(Debug, Deserialize)]
pub(crate) struct SubscribeResponse {
    pub(crate) active_until: Value,
}

/// `POST /redeem` request body.
#[derive(Debug, Serialize)]
pub(crate) struct RedeemBody<'a> {
    pub(crate) user_id: &'a str,
    pub(crate) code: &'a str,
}

/// `POST /redeem` success body.
#[derive(Debug, Deserialize)]
pub(crate) struct RedeemResponse {
    pub(crate) discount_percent: f64,
    pub(crate) days: u32,
}

/// Render a JSON scalar as display text.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(scalar_text))
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse RFC 3339, RFC 2822 (Flask's default rendering) or naive UTC timestamps.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}
