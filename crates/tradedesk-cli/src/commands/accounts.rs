use std::io::{self, BufRead, IsTerminal, Write};

use tradedesk_config::defaults::ENV_USER_ID;
use tradedesk_core::{AccountId, Secret};
use tradedesk_sync::{DeletionOutcome, Notice, RegistrationForm, SessionStatus};

use crate::cli::{AccountAddArgs, AccountRemoveArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult};
use crate::commands::report_stale_listing;
use crate::output::{render_account, render_accounts, render_notice};

pub(crate) async fn handle_accounts_list(ctx: &AppContext) -> CliResult<()> {
    if ctx.session.identity().await.is_none() {
        eprintln!(
            "note: {} (pass --user or set {ENV_USER_ID})",
            SessionStatus::NotLoggedIn.label()
        );
    }
    ctx.session.refresh().await.map_err(|err| {
        let notice = Notice::load_failed(&err);
        CliError::from(err).noticed(&notice)
    })?;
    let snapshot = ctx.session.snapshot().await;
    render_accounts(&snapshot, ctx.output)
}

pub(crate) async fn handle_accounts_add(ctx: &AppContext, args: AccountAddArgs) -> CliResult<()> {
    let form = RegistrationForm {
        platform: args.platform,
        custom_platform: args.custom_platform.unwrap_or_default(),
        login: args.login,
        secret: Secret::new(args.secret),
        server: args.server,
        plan: args.plan.unwrap_or_default(),
        nickname: args.nickname.unwrap_or_default(),
    };
    let synced = ctx.session.register(&form).await.map_err(|err| {
        let notice = Notice::registration_failed(&err);
        CliError::from(err).noticed(&notice)
    })?;
    report_stale_listing(synced.refresh.as_ref());

    let receipt = &synced.value;
    let snapshot = ctx.session.snapshot().await;
    let created = receipt.echoed.as_ref().or_else(|| {
        snapshot.accounts.iter().find(|account| {
            account.login == receipt.submitted.login
                && account.platform == receipt.submitted.platform
        })
    });

    let notice = Notice::registered();
    if ctx.output == OutputFormat::Json {
        return match created {
            Some(account) => render_account(account, ctx.output),
            None => render_notice(&notice, ctx.output),
        };
    }
    render_notice(&notice, ctx.output)?;
    if let Some(account) = created {
        render_account(account, ctx.output)?;
    }
    Ok(())
}

pub(crate) async fn handle_accounts_remove(
    ctx: &AppContext,
    args: AccountRemoveArgs,
) -> CliResult<()> {
    let id = AccountId::new(args.id.trim());
    if id.as_str().is_empty() {
        return Err(CliError::validation("account id is required"));
    }
    let prompt = format!("Are you sure you want to delete trading account {id}? [y/N] ");
    let assume_yes = args.yes;

    let synced = ctx
        .session
        .delete(&id, || assume_yes || confirm_on_terminal(&prompt))
        .await
        .map_err(|err| {
            let notice = Notice::deletion_failed(&err);
            CliError::from(err).noticed(&notice)
        })?;

    match synced.value {
        DeletionOutcome::Deleted => {
            report_stale_listing(synced.refresh.as_ref());
            render_notice(&Notice::deleted(), ctx.output)
        }
        DeletionOutcome::Cancelled => {
            eprintln!("Deletion cancelled.");
            Ok(())
        }
    }
}

/// Ask on stderr and read one line; a non-interactive stdin declines.
fn confirm_on_terminal(prompt: &str) -> bool {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return false;
    }
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut answer = String::new();
    if stdin.lock().read_line(&mut answer).is_err() {
        return false;
    }
    is_affirmative(&answer)
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
