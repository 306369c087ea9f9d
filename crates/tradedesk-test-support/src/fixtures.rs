//! Sample accounts and identities.

use chrono::{DateTime, Duration, TimeZone, Utc};
use tradedesk_core::{AccountId, OwnerId, Plan, Platform, TradingAccount};

/// Owner used by most scenarios.
pub const DEMO_OWNER: &str = "demo_user";

/// The demo owner identity.
#[must_use]
pub fn demo_owner() -> OwnerId {
    OwnerId::new(DEMO_OWNER)
}

/// Fixed reference instant; fixture timestamps are offsets from it.
#[must_use]
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Account owned by `owner`, created `minutes` after [`epoch`].
#[must_use]
pub fn account(
    id: &str,
    owner: &str,
    platform: Platform,
    plan: Plan,
    minutes: i64,
) -> TradingAccount {
    TradingAccount {
        id: AccountId::new(id),
        owner_id: OwnerId::new(owner),
        platform,
        login: format!("10{minutes:04}"),
        server: "demo.broker.example".to_string(),
        plan,
        nickname: None,
        secret_hint: None,
        created_at: epoch() + Duration::minutes(minutes),
    }
}

/// Three demo-owner accounts spanning two platforms with one premium-tier plan of each kind.
#[must_use]
pub fn sample_accounts() -> Vec<TradingAccount> {
    vec![
        account("a-1", DEMO_OWNER, Platform::MetaTrader5, Plan::Basic, 1),
        account("a-2", DEMO_OWNER, Platform::MetaTrader5, Plan::Premium, 2),
        account("a-3", DEMO_OWNER, Platform::Fxcm, Plan::Pro, 3),
    ]
}
