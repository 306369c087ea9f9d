//! Output renderers and formatting helpers for CLI commands.

use std::fmt::Write as _;

use anyhow::anyhow;
use serde::Serialize;
use tradedesk_config::{Endpoint, EndpointPreset};
use tradedesk_core::{AccountSnapshot, TradingAccount};
use tradedesk_sync::{
    Connectivity, DashboardStats, Notice, PricingTier, ProbeOutcome, SessionStatus,
};
use tradedesk_telemetry::mask_login;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

const CREATED_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Everything the dashboard view shows.
#[derive(Debug, Serialize)]
pub(crate) struct DashboardView<'a> {
    pub(crate) session: SessionStatus,
    pub(crate) endpoint: &'a Endpoint,
    pub(crate) connectivity: &'a Connectivity,
    pub(crate) stats: DashboardStats,
}

#[derive(Serialize)]
struct ProbeView<'a> {
    endpoint: &'a Endpoint,
    #[serde(flatten)]
    outcome: &'a ProbeOutcome,
}

#[derive(Serialize)]
struct PresetView<'a> {
    label: &'a str,
    url: &'a str,
    description: &'a str,
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

fn emit(text: &str) {
    println!("{}", text.trim_end());
}

pub(crate) fn render_accounts(snapshot: &AccountSnapshot, format: OutputFormat) -> CliResult<()> {
    let text = match format {
        OutputFormat::Json => to_json(snapshot)?,
        OutputFormat::Table => format_account_table(&snapshot.accounts),
    };
    emit(&text);
    Ok(())
}

pub(crate) fn render_account(account: &TradingAccount, format: OutputFormat) -> CliResult<()> {
    let text = match format {
        OutputFormat::Json => to_json(account)?,
        OutputFormat::Table => format_account_detail(account),
    };
    emit(&text);
    Ok(())
}

pub(crate) fn render_notice(notice: &Notice, format: OutputFormat) -> CliResult<()> {
    let text = match format {
        OutputFormat::Json => to_json(notice)?,
        OutputFormat::Table => notice.to_string(),
    };
    emit(&text);
    Ok(())
}

pub(crate) fn render_probe(
    endpoint: &Endpoint,
    outcome: &ProbeOutcome,
    format: OutputFormat,
) -> CliResult<()> {
    let text = match format {
        OutputFormat::Json => to_json(&ProbeView { endpoint, outcome })?,
        OutputFormat::Table => format!("endpoint: {endpoint}\n{}", Notice::connection(outcome)),
    };
    emit(&text);
    Ok(())
}

pub(crate) fn render_connectivity(
    endpoint: &Endpoint,
    connectivity: &Connectivity,
    format: OutputFormat,
) -> CliResult<()> {
    let text = match format {
        OutputFormat::Json => to_json(connectivity)?,
        OutputFormat::Table => format!(
            "endpoint: {endpoint}\nstatus: {}",
            describe_connectivity(connectivity)
        ),
    };
    emit(&text);
    Ok(())
}

pub(crate) fn render_dashboard(view: &DashboardView<'_>, format: OutputFormat) -> CliResult<()> {
    let text = match format {
        OutputFormat::Json => to_json(view)?,
        OutputFormat::Table => format_dashboard(view),
    };
    emit(&text);
    Ok(())
}

pub(crate) fn render_pricing(tiers: &[PricingTier], format: OutputFormat) -> CliResult<()> {
    let text = match format {
        OutputFormat::Json => to_json(tiers)?,
        OutputFormat::Table => format_pricing(tiers),
    };
    emit(&text);
    Ok(())
}

pub(crate) fn render_presets(presets: &[EndpointPreset], format: OutputFormat) -> CliResult<()> {
    let text = match format {
        OutputFormat::Json => {
            let views: Vec<PresetView<'_>> = presets
                .iter()
                .map(|preset| PresetView {
                    label: preset.label,
                    url: preset.url,
                    description: preset.description,
                })
                .collect();
            to_json(&views)?
        }
        OutputFormat::Table => format_presets(presets),
    };
    emit(&text);
    Ok(())
}

pub(crate) fn format_account_table(accounts: &[TradingAccount]) -> String {
    if accounts.is_empty() {
        return "No trading accounts registered.".to_string();
    }
    let mut out = format!(
        "{:<12} {:<24} {:<20} {:<10} {:<18} {:<8} CREATED\n",
        "ID", "NAME", "PLATFORM", "LOGIN", "SERVER", "PLAN"
    );
    for account in accounts {
        let _ = writeln!(
            out,
            "{:<12} {:<24} {:<20} {:<10} {:<18} {:<8} {}",
            account.id.as_str(),
            account.display_name(),
            account.platform.label(),
            mask_login(&account.login),
            account.server_abbrev(),
            account.plan.as_str(),
            account.created_at.format(CREATED_FORMAT)
        );
    }
    out
}

pub(crate) fn format_account_detail(account: &TradingAccount) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "id: {}", account.id);
    let _ = writeln!(out, "name: {}", account.display_name());
    let _ = writeln!(out, "platform: {}", account.platform);
    let _ = writeln!(out, "login: {}", mask_login(&account.login));
    let _ = writeln!(out, "server: {}", account.server);
    let _ = writeln!(out, "plan: {}", account.plan);
    if let Some(hint) = &account.secret_hint {
        let _ = writeln!(out, "secret: {hint}");
    }
    let _ = writeln!(out, "created: {}", account.created_at.format(CREATED_FORMAT));
    out
}

pub(crate) fn format_dashboard(view: &DashboardView<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "session: {}", view.session.label());
    let _ = writeln!(out, "endpoint: {}", view.endpoint);
    let _ = writeln!(out, "connectivity: {}", describe_connectivity(view.connectivity));
    let _ = writeln!(out, "total accounts: {}", view.stats.total_accounts);
    let _ = writeln!(out, "platforms: {}", view.stats.distinct_platforms);
    let _ = writeln!(out, "premium accounts: {}", view.stats.premium_count);
    out
}

pub(crate) fn format_pricing(tiers: &[PricingTier]) -> String {
    let mut out = String::new();
    for tier in tiers {
        let badge = if tier.popular { " (most popular)" } else { "" };
        let _ = writeln!(out, "{} ${}/month{badge}", tier.name, tier.monthly_price_usd);
        let _ = writeln!(out, "  {}", tier.description);
        for feature in tier.features {
            let _ = writeln!(out, "  - {feature}");
        }
    }
    out
}

pub(crate) fn format_presets(presets: &[EndpointPreset]) -> String {
    let mut out = format!("{:<24} {:<28} DESCRIPTION\n", "LABEL", "URL");
    for preset in presets {
        let _ = writeln!(
            out,
            "{:<24} {:<28} {}",
            preset.label, preset.url, preset.description
        );
    }
    out
}

pub(crate) fn describe_connectivity(connectivity: &Connectivity) -> String {
    match connectivity {
        Connectivity::Unknown => connectivity.label().to_string(),
        Connectivity::Online { platform: Some(platform) } => {
            format!("{} ({platform})", connectivity.label())
        }
        Connectivity::Online { platform: None } => connectivity.label().to_string(),
        Connectivity::Offline { reason } => format!("{} ({reason})", connectivity.label()),
    }
}
