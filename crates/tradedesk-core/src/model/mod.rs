//! Trading account domain types shared across the workspace.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque identifier assigned by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(String);

impl AccountId {
    /// Wrap a raw identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Serialize for AccountId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Signed(value) => Self(value.to_string()),
            RawId::Unsigned(value) => Self(value.to_string()),
        })
    }
}

/// Identifier of the authenticated owner supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Wrap a raw owner identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trading platform or broker hosting an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Platform {
    /// MetaTrader 4 terminal.
    MetaTrader4,
    /// MetaTrader 5 terminal.
    MetaTrader5,
    /// cTrader terminal.
    CTrader,
    /// XM Global broker.
    XmGlobal,
    /// FXCM broker.
    Fxcm,
    /// IG Markets broker.
    IgMarkets,
    /// Plus500 broker.
    Plus500,
    /// eToro broker.
    Etoro,
    /// Interactive Brokers.
    InteractiveBrokers,
    /// TD Ameritrade broker.
    TdAmeritrade,
    /// Any platform outside the recognized set, carrying its custom name.
    Other(String),
}

impl Platform {
    /// Every recognized platform, in the order offered to users.
    pub const RECOGNIZED: [Self; 10] = [
        Self::MetaTrader5,
        Self::MetaTrader4,
        Self::CTrader,
        Self::XmGlobal,
        Self::Fxcm,
        Self::IgMarkets,
        Self::Plus500,
        Self::Etoro,
        Self::InteractiveBrokers,
        Self::TdAmeritrade,
    ];

    /// Display label, which is also the wire value.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::MetaTrader4 => "MetaTrader 4",
            Self::MetaTrader5 => "MetaTrader 5",
            Self::CTrader => "cTrader",
            Self::XmGlobal => "XM Global",
            Self::Fxcm => "FXCM",
            Self::IgMarkets => "IG Markets",
            Self::Plus500 => "Plus500",
            Self::Etoro => "eToro",
            Self::InteractiveBrokers => "Interactive Brokers",
            Self::TdAmeritrade => "TD Ameritrade",
            Self::Other(name) => name,
        }
    }

    /// Resolve a recognized label, ignoring ASCII case and surrounding whitespace.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::RECOGNIZED
            .into_iter()
            .find(|platform| platform.label().eq_ignore_ascii_case(label))
    }

    /// Interpret a value returned by the remote store; unknown values become [`Platform::Other`].
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        Self::RECOGNIZED
            .into_iter()
            .find(|platform| platform.label() == value)
            .unwrap_or_else(|| Self::Other(value.to_string()))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Platform {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Platform {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&raw))
    }
}

/// Subscription plan attached to an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Plan {
    /// Entry plan, assumed when none is chosen.
    #[default]
    Basic,
    /// Premium plan.
    Premium,
    /// Pro plan.
    Pro,
    /// Value returned by the remote store that the client does not recognize.
    Other(String),
}

impl Plan {
    /// Plans a user may choose at registration.
    pub const SELECTABLE: [Self; 3] = [Self::Basic, Self::Premium, Self::Pro];

    /// Wire and display value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Basic => "Basic",
            Self::Premium => "Premium",
            Self::Pro => "Pro",
            Self::Other(raw) => raw,
        }
    }

    /// Resolve a user-supplied plan name, ignoring ASCII case.
    #[must_use]
    pub fn from_input(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::SELECTABLE
            .into_iter()
            .find(|plan| plan.as_str().eq_ignore_ascii_case(value))
    }

    /// Interpret a value returned by the remote store; only exact names are recognized.
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        Self::SELECTABLE
            .into_iter()
            .find(|plan| plan.as_str() == value)
            .unwrap_or_else(|| Self::Other(value.to_string()))
    }

    /// Whether the plan counts towards the premium tally.
    #[must_use]
    pub const fn is_premium(&self) -> bool {
        matches!(self, Self::Premium | Self::Pro)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Plan {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Plan {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&raw))
    }
}

/// Account credential. Never printed in full.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Secret(String);

const SECRET_HINT_PREFIX: usize = 3;

impl Secret {
    /// Wrap a raw credential.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw credential, for request bodies only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the credential is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Truncated prefix suitable for display.
    ///
    /// Short credentials reveal nothing.
    #[must_use]
    pub fn hint(&self) -> String {
        if self.0.chars().count() <= SECRET_HINT_PREFIX * 2 {
            return "***".to_string();
        }
        let prefix: String = self.0.chars().take(SECRET_HINT_PREFIX).collect();
        format!("{prefix}...")
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

const SERVER_ABBREV_CHARS: usize = 15;

/// Account record as held by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingAccount {
    /// Identifier assigned by the remote store.
    pub id: AccountId,
    /// Owner of the account.
    pub owner_id: OwnerId,
    /// Hosting platform or broker.
    pub platform: Platform,
    /// Account login or number.
    pub login: String,
    /// Broker server or connection string.
    pub server: String,
    /// Subscription plan.
    pub plan: Plan,
    /// Optional user-chosen label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// Truncated credential prefix when the store reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_hint: Option<String>,
    /// Creation timestamp set by the store.
    pub created_at: DateTime<Utc>,
}

impl TradingAccount {
    /// Nickname when set, otherwise the derived platform label.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.nickname.as_deref().map(str::trim) {
            Some(nickname) if !nickname.is_empty() => nickname.to_string(),
            _ => default_nickname(&self.platform),
        }
    }

    /// Server string shortened for narrow displays.
    #[must_use]
    pub fn server_abbrev(&self) -> String {
        if self.server.chars().count() > SERVER_ABBREV_CHARS {
            let head: String = self.server.chars().take(SERVER_ABBREV_CHARS).collect();
            format!("{head}...")
        } else {
            self.server.clone()
        }
    }
}

/// Nickname derived for accounts registered without one.
#[must_use]
pub fn default_nickname(platform: &Platform) -> String {
    format!("{} Account", platform.label())
}

/// Validated registration payload submitted to the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    /// Owner the account is registered for.
    pub owner_id: OwnerId,
    /// Hosting platform or broker.
    pub platform: Platform,
    /// Account login or number.
    pub login: String,
    /// Credential.
    pub secret: Secret,
    /// Broker server or connection string.
    pub server: String,
    /// Chosen plan.
    pub plan: Plan,
    /// Nickname, already derived when the user left it empty.
    pub nickname: String,
}

/// Immutable, versioned view of the current identity's accounts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AccountSnapshot {
    /// Refresh token that produced this snapshot; `0` before any refresh.
    pub version: u64,
    /// Accounts ordered newest first.
    pub accounts: Vec<TradingAccount>,
}

impl AccountSnapshot {
    /// Snapshot with no accounts.
    #[must_use]
    pub const fn empty(version: u64) -> Self {
        Self {
            version,
            accounts: Vec::new(),
        }
    }

    /// Shared handle to an empty snapshot.
    #[must_use]
    pub fn shared_empty(version: u64) -> Arc<Self> {
        Arc::new(Self::empty(version))
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the snapshot holds no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Look up an account by identifier.
    #[must_use]
    pub fn get(&self, id: &AccountId) -> Option<&TradingAccount> {
        self.accounts.iter().find(|account| &account.id == id)
    }

    /// Whether an account with the identifier is present.
    #[must_use]
    pub fn contains(&self, id: &AccountId) -> bool {
        self.get(id).is_some()
    }
}

/// Successful liveness response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HealthReport {
    /// Platform label reported by the server, display only.
    #[serde(default)]
    pub platform: Option<String>,
}

/// Billing cadence for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    /// Billed every month.
    Monthly,
    /// Billed every year.
    Yearly,
}

impl BillingPeriod {
    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

/// Confirmation of an activated subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionReceipt {
    /// Expiry of the subscription as reported by the server.
    pub active_until: String,
}

/// Outcome of a redeemed promo code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PromoRedemption {
    /// Discount granted, in percent.
    pub discount_percent: f64,
    /// Number of days the discount applies.
    pub days: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn account(nickname: Option<&str>, server: &str) -> TradingAccount {
        TradingAccount {
            id: AccountId::new("1"),
            owner_id: OwnerId::new("owner"),
            platform: Platform::MetaTrader5,
            login: "12345".into(),
            server: server.into(),
            plan: Plan::Pro,
            nickname: nickname.map(str::to_string),
            secret_hint: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn platform_labels_round_trip_and_unknowns_become_other() {
        for platform in Platform::RECOGNIZED {
            assert_eq!(Platform::from_wire(platform.label()), platform);
            assert_eq!(Platform::from_label(&platform.label().to_uppercase()), Some(platform));
        }
        assert_eq!(Platform::from_label("Binance"), None);
        assert_eq!(
            Platform::from_wire("Binance"),
            Platform::Other("Binance".into())
        );
    }

    #[test]
    fn plan_wire_matching_is_exact() {
        assert!(Plan::from_wire("Premium").is_premium());
        assert!(Plan::from_wire("Pro").is_premium());
        assert!(!Plan::from_wire("premium").is_premium());
        assert_eq!(Plan::from_wire("Gold"), Plan::Other("Gold".into()));
        assert_eq!(Plan::from_input(" pro "), Some(Plan::Pro));
        assert_eq!(Plan::from_input("Gold"), None);
        assert_eq!(Plan::default(), Plan::Basic);
    }

    #[test]
    fn secret_debug_is_redacted_and_hint_is_truncated() {
        let secret = Secret::new("abcdefgh123");
        assert_eq!(format!("{secret:?}"), "Secret(<redacted>)");
        assert_eq!(secret.hint(), "abc...");
        assert_eq!(Secret::new("short").hint(), "***");
    }

    #[test]
    fn display_name_falls_back_to_platform_label() {
        assert_eq!(account(None, "s").display_name(), "MetaTrader 5 Account");
        assert_eq!(account(Some("  "), "s").display_name(), "MetaTrader 5 Account");
        assert_eq!(account(Some("Swing"), "s").display_name(), "Swing");
    }

    #[test]
    fn server_abbrev_cuts_after_fifteen_chars() {
        assert_eq!(account(None, "mt5.broker.com").server_abbrev(), "mt5.broker.com");
        assert_eq!(
            account(None, "mt5-live.example-broker.com").server_abbrev(),
            "mt5-live.exampl..."
        );
    }

    #[test]
    fn account_id_accepts_numbers_and_strings() {
        let numeric: AccountId = serde_json::from_str("42").expect("numeric id");
        let text: AccountId = serde_json::from_str("\"abc\"").expect("string id");
        assert_eq!(numeric.as_str(), "42");
        assert_eq!(text.as_str(), "abc");
        assert_eq!(serde_json::to_string(&numeric).expect("serialize"), "\"42\"");
    }

    #[test]
    fn snapshot_lookup_helpers() {
        let snapshot = AccountSnapshot {
            version: 3,
            accounts: vec![account(None, "s")],
        };
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains(&AccountId::new("1")));
        assert!(!snapshot.contains(&AccountId::new("2")));
        assert!(AccountSnapshot::shared_empty(4).is_empty());
    }

    #[test]
    fn billing_period_uses_lowercase_wire_values() {
        assert_eq!(
            serde_json::to_string(&BillingPeriod::Yearly).expect("serialize"),
            "\"yearly\""
        );
        assert_eq!(BillingPeriod::Monthly.as_str(), "monthly");
    }
}
