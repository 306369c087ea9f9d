use std::sync::Arc;

use anyhow::Context;
use tradedesk_config::Endpoint;
use tradedesk_core::{AccountId, Plan, Platform, Secret};
use tradedesk_sync::{
    DeletionOutcome, RefreshOutcome, RegistrationForm, Session, SessionStatus, aggregate,
};
use tradedesk_test_support::fixtures::{DEMO_OWNER, account, demo_owner, sample_accounts};
use tradedesk_test_support::mocks::ScriptedStore;

fn signed_out(accounts: Vec<tradedesk_core::TradingAccount>) -> (Arc<ScriptedStore>, Session) {
    let store = Arc::new(ScriptedStore::with_accounts(accounts));
    let session = Session::new(store.clone(), Endpoint::default());
    (store, session)
}

fn metatrader_form() -> RegistrationForm {
    RegistrationForm {
        platform: "MetaTrader 5".into(),
        login: "12345".into(),
        secret: Secret::new("abc123xyz"),
        server: "mt5.broker.com".into(),
        plan: "Pro".into(),
        ..RegistrationForm::default()
    }
}

#[tokio::test]
async fn register_then_refresh_adds_exactly_one_matching_entry() -> anyhow::Result<()> {
    let (_, session) = signed_out(sample_accounts());
    session.set_identity(Some(demo_owner())).await?;
    let before = session.snapshot().await;

    let synced = session.register(&metatrader_form()).await?;
    synced.refresh.context("refresh after register")??;
    let after = session.snapshot().await;

    let added: Vec<_> = after
        .accounts
        .iter()
        .filter(|a| !before.contains(&a.id))
        .collect();
    assert_eq!(added.len(), 1);
    assert_eq!(after.len(), before.len() + 1);

    let created = added[0];
    assert_eq!(created.login, "12345");
    assert_eq!(created.platform, Platform::MetaTrader5);
    assert_eq!(created.server, "mt5.broker.com");
    assert_eq!(created.plan, Plan::Pro);
    assert_eq!(created.owner_id, demo_owner());
    assert_eq!(created.nickname.as_deref(), Some("MetaTrader 5 Account"));
    assert_eq!(created.display_name(), "MetaTrader 5 Account");
    Ok(())
}

#[tokio::test]
async fn acknowledged_register_without_echo_still_shows_after_refresh() -> anyhow::Result<()> {
    let (store, session) = signed_out(Vec::new());
    store.set_echo_register(false);
    session.set_identity(Some(demo_owner())).await?;

    let synced = session.register(&metatrader_form()).await?;
    assert!(synced.value.echoed.is_none());
    assert_eq!(synced.value.submitted.nickname, "MetaTrader 5 Account");
    assert_eq!(session.snapshot().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn delete_then_refresh_removes_the_entry() -> anyhow::Result<()> {
    let (_, session) = signed_out(sample_accounts());
    session.set_identity(Some(demo_owner())).await?;
    let target = AccountId::new("a-2");
    assert!(session.snapshot().await.contains(&target));

    let synced = session.delete(&target, || true).await?;
    assert_eq!(synced.value, DeletionOutcome::Deleted);
    synced.refresh.context("refresh after delete")??;

    let snapshot = session.snapshot().await;
    assert!(!snapshot.contains(&target));
    assert_eq!(snapshot.len(), 2);
    Ok(())
}

#[tokio::test]
async fn deletions_of_different_ids_commute() -> anyhow::Result<()> {
    let (_, forward) = signed_out(sample_accounts());
    let (_, backward) = signed_out(sample_accounts());
    forward.set_identity(Some(demo_owner())).await?;
    backward.set_identity(Some(demo_owner())).await?;

    for id in ["a-1", "a-3"] {
        forward.delete(&AccountId::new(id), || true).await?;
    }
    for id in ["a-3", "a-1"] {
        backward.delete(&AccountId::new(id), || true).await?;
    }
    assert_eq!(
        forward.snapshot().await.accounts,
        backward.snapshot().await.accounts
    );
    Ok(())
}

#[tokio::test]
async fn aggregate_is_idempotent_over_a_snapshot() -> anyhow::Result<()> {
    let (_, session) = signed_out(sample_accounts());
    session.set_identity(Some(demo_owner())).await?;
    let snapshot = session.snapshot().await;

    let first = aggregate(&snapshot.accounts);
    let second = aggregate(&snapshot.accounts);
    assert_eq!(first, second);
    assert_eq!(first, session.stats().await);
    Ok(())
}

#[tokio::test]
async fn stats_are_unaffected_by_later_snapshots() -> anyhow::Result<()> {
    let (store, session) = signed_out(sample_accounts());
    session.set_identity(Some(demo_owner())).await?;
    let stats = session.stats().await;

    store.insert(account("a-4", DEMO_OWNER, Platform::Etoro, Plan::Premium, 4));
    session.refresh().await?;
    assert_eq!(stats.total_accounts, 3);
    assert_eq!(session.stats().await.total_accounts, 4);
    Ok(())
}

#[tokio::test]
async fn absent_identity_always_yields_empty_snapshot() -> anyhow::Result<()> {
    let (store, session) = signed_out(sample_accounts());
    assert_eq!(session.status().await, SessionStatus::NotLoggedIn);

    for _ in 0..3 {
        let outcome = session.refresh().await?;
        assert!(matches!(outcome, RefreshOutcome::Committed(ref s) if s.is_empty()));
    }
    assert_eq!(store.call_count("list_accounts"), 0);
    Ok(())
}

#[tokio::test]
async fn newer_refresh_wins_over_slower_older_one() -> anyhow::Result<()> {
    let (store, session) = signed_out(sample_accounts());
    let session = Arc::new(session);
    session.set_identity(Some(demo_owner())).await?;

    let gate = store.gate_next_list();
    let older = {
        let session = session.clone();
        tokio::spawn(async move { session.refresh().await })
    };
    gate.entered.await?;

    store.insert(account("a-5", DEMO_OWNER, Platform::CTrader, Plan::Basic, 5));
    let newer = session.refresh().await?;
    let committed = newer.snapshot().context("newer refresh commits")?.clone();
    assert_eq!(committed.len(), 4);

    gate.release
        .send(())
        .map_err(|()| anyhow::anyhow!("older refresh already finished"))?;
    assert_eq!(older.await??, RefreshOutcome::Superseded);

    let current = session.snapshot().await;
    assert_eq!(current, committed);
    assert_eq!(current.accounts[0].id.as_str(), "a-5");
    Ok(())
}
