//! Argument parsing, settings resolution and command dispatch.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tradedesk_config::{ClientSettings, ConfigResult, Endpoint, LogFormatSetting};
use tradedesk_core::BillingPeriod;
use tradedesk_telemetry::{GlobalContextGuard, LogFormat, LoggingConfig, init_logging};

use crate::client::{AppContext, CliError, CliResult};
use crate::commands::accounts::{
    handle_accounts_add, handle_accounts_list, handle_accounts_remove,
};
use crate::commands::billing::{handle_pricing, handle_redeem, handle_subscribe};
use crate::commands::dashboard::handle_dashboard;
use crate::commands::endpoint::{
    handle_endpoint_presets, handle_endpoint_set, handle_endpoint_test, handle_health,
};

/// Parses CLI arguments, executes the requested command and reports the
/// outcome. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    execute(cli, ClientSettings::from_env()).await
}

async fn execute(cli: Cli, base: ConfigResult<ClientSettings>) -> i32 {
    let command_name = command_label(&cli.command);
    let settings = match base
        .map_err(|err| CliError::validation(err.to_string()))
        .and_then(|settings| resolve_settings(&cli, settings))
    {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            return err.exit_code();
        }
    };

    install_logging(&settings);
    let _context = GlobalContextGuard::new(command_name);

    let result = match AppContext::connect(&settings, cli.output) {
        Ok(ctx) => dispatch(cli.command, &ctx).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => {
            info!(command = command_name, "command completed");
            0
        }
        Err(err) => {
            let exit_code = err.exit_code();
            let message = err.display_message();
            warn!(command = command_name, exit_code, error = %message, "command failed");
            eprintln!("error: {message}");
            exit_code
        }
    }
}

pub(crate) async fn dispatch(command: Command, ctx: &AppContext) -> CliResult<()> {
    match command {
        Command::Health => handle_health(ctx).await,
        Command::Endpoint(endpoint) => match endpoint {
            EndpointCommand::Presets => handle_endpoint_presets(ctx),
            EndpointCommand::Test(args) => handle_endpoint_test(ctx, args).await,
            EndpointCommand::Set(args) => handle_endpoint_set(ctx, args).await,
        },
        Command::Accounts(accounts) => match accounts {
            AccountsCommand::Ls => handle_accounts_list(ctx).await,
            AccountsCommand::Add(args) => handle_accounts_add(ctx, args).await,
            AccountsCommand::Rm(args) => handle_accounts_remove(ctx, args).await,
        },
        Command::Dashboard => handle_dashboard(ctx).await,
        Command::Pricing => handle_pricing(ctx),
        Command::Subscribe(args) => handle_subscribe(ctx, args).await,
        Command::Redeem(args) => handle_redeem(ctx, args).await,
    }
}

/// Apply command-line overrides on top of environment settings.
pub(crate) fn resolve_settings(
    cli: &Cli,
    mut settings: ClientSettings,
) -> CliResult<ClientSettings> {
    if let Some(raw) = &cli.api_url {
        settings.endpoint = Endpoint::parse(raw)
            .map_err(|err| CliError::validation(format!("invalid --api-url: {err}")))?;
    }
    if let Some(user) = &cli.user {
        let user = user.trim();
        settings.user_id = (!user.is_empty()).then(|| user.to_string());
    }
    if let Some(secs) = cli.timeout {
        if secs == 0 {
            return Err(CliError::validation(
                "--timeout must be a positive number of seconds",
            ));
        }
        settings.http_timeout = Duration::from_secs(secs);
    }
    if let Some(level) = &cli.log_level {
        settings.log_level.clone_from(level);
    }
    if let Some(format) = &cli.log_format {
        settings.log_format = format
            .parse()
            .map_err(|err: tradedesk_config::ConfigError| CliError::validation(err.to_string()))?;
    }
    Ok(settings)
}

fn install_logging(settings: &ClientSettings) {
    let format = match settings.log_format {
        LogFormatSetting::Auto => LogFormat::infer(),
        LogFormatSetting::Json => LogFormat::Json,
        LogFormatSetting::Pretty => LogFormat::Pretty,
    };
    let config = LoggingConfig {
        level: &settings.log_level,
        format,
        build_sha: option_env!("TRADEDESK_BUILD_SHA").unwrap_or("dev"),
    };
    if let Err(err) = init_logging(&config) {
        eprintln!("warning: logging disabled: {err}");
    }
}

#[derive(Parser)]
#[command(
    name = "tradedesk",
    about = "Manage trading accounts registered with a TradeDesk service"
)]
pub(crate) struct Cli {
    /// Base URL of the account service (falls back to `TRADEDESK_API_URL`).
    #[arg(long, global = true)]
    pub(crate) api_url: Option<String>,
    /// Signed-in user identifier (falls back to `TRADEDESK_USER_ID`).
    #[arg(long, global = true)]
    pub(crate) user: Option<String>,
    /// HTTP timeout in seconds (falls back to `TRADEDESK_HTTP_TIMEOUT_SECS`).
    #[arg(long, global = true)]
    pub(crate) timeout: Option<u64>,
    /// Tracing level directive (falls back to `TRADEDESK_LOG_LEVEL`).
    #[arg(long, global = true)]
    pub(crate) log_level: Option<String>,
    /// Log format: auto, json or pretty (falls back to `TRADEDESK_LOG_FORMAT`).
    #[arg(long, global = true)]
    pub(crate) log_format: Option<String>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Probe the configured endpoint.
    Health,
    #[command(subcommand)]
    Endpoint(EndpointCommand),
    #[command(subcommand)]
    Accounts(AccountsCommand),
    /// Show account statistics for the signed-in user.
    Dashboard,
    /// List the offered subscription tiers.
    Pricing,
    /// Subscribe to a pricing tier, e.g. `subscribe pro yearly`.
    Subscribe(SubscribeArgs),
    Redeem(RedeemArgs),
}

#[derive(Subcommand)]
pub(crate) enum EndpointCommand {
    /// List named endpoint suggestions.
    Presets,
    /// Probe a candidate endpoint without switching to it.
    Test(EndpointArgs),
    /// Verify a candidate endpoint and switch to it.
    Set(EndpointArgs),
}

#[derive(Args)]
pub(crate) struct EndpointArgs {
    pub(crate) url: String,
}

#[derive(Subcommand)]
pub(crate) enum AccountsCommand {
    /// List the signed-in user's accounts, newest first.
    Ls,
    /// Register a new trading account.
    Add(AccountAddArgs),
    /// Delete a trading account.
    Rm(AccountRemoveArgs),
}

#[derive(Args)]
pub(crate) struct AccountAddArgs {
    /// Platform label, or `Other` together with `--custom-platform`.
    #[arg(long)]
    pub(crate) platform: String,
    #[arg(long)]
    pub(crate) custom_platform: Option<String>,
    #[arg(long)]
    pub(crate) login: String,
    #[arg(long, env = "TRADEDESK_ACCOUNT_SECRET", hide_env_values = true)]
    pub(crate) secret: String,
    #[arg(long)]
    pub(crate) server: String,
    /// Basic, Premium or Pro (defaults to Basic).
    #[arg(long)]
    pub(crate) plan: Option<String>,
    #[arg(long)]
    pub(crate) nickname: Option<String>,
}

#[derive(Args)]
pub(crate) struct AccountRemoveArgs {
    pub(crate) id: String,
    /// Skip the confirmation prompt.
    #[arg(long, short = 'y')]
    pub(crate) yes: bool,
}

#[derive(Args)]
pub(crate) struct SubscribeArgs {
    /// Pricing tier identifier (see `pricing`).
    pub(crate) tier: String,
    #[arg(value_enum)]
    pub(crate) period: PeriodArg,
}

#[derive(Args)]
pub(crate) struct RedeemArgs {
    pub(crate) code: String,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum PeriodArg {
    Monthly,
    Yearly,
}

impl From<PeriodArg> for BillingPeriod {
    fn from(value: PeriodArg) -> Self {
        match value {
            PeriodArg::Monthly => Self::Monthly,
            PeriodArg::Yearly => Self::Yearly,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub(crate) const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Health => "health",
        Command::Endpoint(EndpointCommand::Presets) => "endpoint_presets",
        Command::Endpoint(EndpointCommand::Test(_)) => "endpoint_test",
        Command::Endpoint(EndpointCommand::Set(_)) => "endpoint_set",
        Command::Accounts(AccountsCommand::Ls) => "accounts_ls",
        Command::Accounts(AccountsCommand::Add(_)) => "accounts_add",
        Command::Accounts(AccountsCommand::Rm(_)) => "accounts_rm",
        Command::Dashboard => "dashboard",
        Command::Pricing => "pricing",
        Command::Subscribe(_) => "subscribe",
        Command::Redeem(_) => "redeem",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradedesk_config::ConfigError;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tradedesk").chain(args.iter().copied()))
            .expect("arguments parse")
    }

    #[test]
    fn labels_cover_nested_commands() {
        assert_eq!(command_label(&parse(&["health"]).command), "health");
        assert_eq!(
            command_label(&parse(&["endpoint", "test", "http://localhost:5000"]).command),
            "endpoint_test"
        );
        assert_eq!(
            command_label(&parse(&["accounts", "rm", "acc-1", "--yes"]).command),
            "accounts_rm"
        );
        assert_eq!(
            command_label(&parse(&["subscribe", "pro", "yearly"]).command),
            "subscribe"
        );
    }

    #[test]
    fn flags_override_environment_settings() {
        let cli = parse(&[
            "--api-url",
            "https://api.example.com/",
            "--user",
            " demo_user ",
            "--timeout",
            "3",
            "--log-format",
            "json",
            "--output",
            "json",
            "dashboard",
        ]);
        let settings = resolve_settings(&cli, ClientSettings::default()).expect("valid flags");
        assert_eq!(settings.endpoint.as_str(), "https://api.example.com");
        assert_eq!(settings.user_id.as_deref(), Some("demo_user"));
        assert_eq!(settings.http_timeout, Duration::from_secs(3));
        assert_eq!(settings.log_format, LogFormatSetting::Json);
        assert_eq!(cli.output, OutputFormat::Json);
    }

    #[test]
    fn absent_flags_keep_environment_settings() {
        let base = ClientSettings {
            user_id: Some("from_env".into()),
            ..ClientSettings::default()
        };
        let settings = resolve_settings(&parse(&["pricing"]), base.clone()).expect("valid");
        assert_eq!(settings, base);
    }

    #[test]
    fn blank_user_flag_signs_out() {
        let base = ClientSettings {
            user_id: Some("from_env".into()),
            ..ClientSettings::default()
        };
        let settings =
            resolve_settings(&parse(&["--user", "  ", "accounts", "ls"]), base).expect("valid");
        assert!(settings.user_id.is_none());
    }

    #[test]
    fn invalid_flags_are_validation_errors() {
        let err = resolve_settings(
            &parse(&["--api-url", "ftp://x", "health"]),
            ClientSettings::default(),
        )
        .expect_err("bad url");
        assert_eq!(err.exit_code(), 2);

        let err = resolve_settings(
            &parse(&["--timeout", "0", "health"]),
            ClientSettings::default(),
        )
        .expect_err("zero timeout");
        assert!(err.display_message().contains("--timeout"));

        let err = resolve_settings(
            &parse(&["--log-format", "xml", "health"]),
            ClientSettings::default(),
        )
        .expect_err("bad format");
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn environment_errors_exit_with_validation_code() {
        let code = execute(
            parse(&["pricing"]),
            Err(ConfigError::InvalidField {
                field: "TRADEDESK_HTTP_TIMEOUT_SECS",
                value: Some("soon".into()),
                reason: "expected a positive integer",
            }),
        )
        .await;
        assert_eq!(code, 2);
    }

    #[test]
    fn period_maps_to_billing_period() {
        assert_eq!(BillingPeriod::from(PeriodArg::Monthly), BillingPeriod::Monthly);
        assert_eq!(BillingPeriod::from(PeriodArg::Yearly), BillingPeriod::Yearly);
    }
}
