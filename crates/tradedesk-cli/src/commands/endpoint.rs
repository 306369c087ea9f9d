use anyhow::anyhow;
use tradedesk_config::defaults::ENV_API_URL;
use tradedesk_sync::{Connectivity, EndpointError, EndpointStore, Notice};

use crate::cli::{EndpointArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult};
use crate::commands::report_stale_listing;
use crate::output::{render_connectivity, render_notice, render_presets, render_probe};

pub(crate) async fn handle_health(ctx: &AppContext) -> CliResult<()> {
    let endpoint = ctx.session.endpoint().await;
    let connectivity = ctx.session.refresh_connectivity().await;
    render_connectivity(&endpoint, &connectivity, ctx.output)?;
    match connectivity {
        Connectivity::Offline { reason } => Err(CliError::failure(anyhow!(
            "{endpoint} is unreachable: {reason}"
        ))),
        Connectivity::Online { .. } | Connectivity::Unknown => Ok(()),
    }
}

pub(crate) fn handle_endpoint_presets(ctx: &AppContext) -> CliResult<()> {
    render_presets(EndpointStore::presets(), ctx.output)
}

pub(crate) async fn handle_endpoint_test(ctx: &AppContext, args: EndpointArgs) -> CliResult<()> {
    let (endpoint, outcome) = ctx
        .session
        .test_endpoint(&args.url)
        .await
        .map_err(rejected)?;
    if !outcome.is_online() {
        return Err(CliError::failure(anyhow!("{}", Notice::connection(&outcome))));
    }
    render_probe(&endpoint, &outcome, ctx.output)
}

pub(crate) async fn handle_endpoint_set(ctx: &AppContext, args: EndpointArgs) -> CliResult<()> {
    let synced = ctx.session.set_endpoint(&args.url).await.map_err(rejected)?;
    render_notice(&Notice::endpoint_saved(), ctx.output)?;
    if ctx.output == OutputFormat::Table {
        println!("export {ENV_API_URL}={}", synced.value.endpoint);
    }
    report_stale_listing(synced.refresh.as_ref());
    Ok(())
}

fn rejected(err: impl Into<EndpointError>) -> CliError {
    let err = err.into();
    let notice = Notice::endpoint_rejected(&err);
    CliError::from(err).noticed(&notice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::prelude::*;
    use serde_json::json;
    use tradedesk_config::{ClientSettings, Endpoint};

    fn context_for(server: &MockServer) -> Result<AppContext> {
        let settings = ClientSettings {
            endpoint: Endpoint::parse(&server.base_url())?,
            user_id: Some("demo_user".to_string()),
            ..ClientSettings::default()
        };
        AppContext::connect(&settings, OutputFormat::Table)
            .map_err(|err| anyhow!(err.display_message()))
    }

    #[tokio::test]
    async fn health_reports_online_service() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(200).json_body(json!({"platform": "MetaTrader"}));
        });

        let ctx = context_for(&server)?;
        handle_health(&ctx)
            .await
            .map_err(|err| anyhow!(err.display_message()))?;
        mock.assert();
        assert_eq!(
            ctx.session.connectivity().await,
            Connectivity::Online {
                platform: Some("MetaTrader".to_string())
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn health_fails_when_service_is_down() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(503);
        });

        let ctx = context_for(&server)?;
        let err = handle_health(&ctx).await.expect_err("offline");
        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().contains("is unreachable"));
        Ok(())
    }

    #[tokio::test]
    async fn endpoint_test_rejects_blank_input() -> Result<()> {
        let server = MockServer::start_async().await;
        let ctx = context_for(&server)?;
        let err = handle_endpoint_test(
            &ctx,
            EndpointArgs {
                url: "   ".to_string(),
            },
        )
        .await
        .expect_err("blank url");
        assert_eq!(err.exit_code(), 2);
        assert!(
            err.display_message()
                .starts_with("Error: Please enter a valid API URL")
        );
        assert_eq!(ctx.session.connectivity().await, Connectivity::Unknown);
        Ok(())
    }

    #[tokio::test]
    async fn endpoint_test_does_not_commit() -> Result<()> {
        let current = MockServer::start_async().await;
        let candidate = MockServer::start_async().await;
        let probe = candidate.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(200).json_body(json!({"platform": "cTrader"}));
        });

        let ctx = context_for(&current)?;
        handle_endpoint_test(
            &ctx,
            EndpointArgs {
                url: format!("{}/", candidate.base_url()),
            },
        )
        .await
        .map_err(|err| anyhow!(err.display_message()))?;
        probe.assert();
        assert_eq!(
            ctx.session.endpoint().await.as_str(),
            current.base_url().as_str()
        );
        Ok(())
    }

    #[tokio::test]
    async fn endpoint_set_commits_and_reloads_from_new_service() -> Result<()> {
        let current = MockServer::start_async().await;
        let candidate = MockServer::start_async().await;
        candidate.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(200).json_body(json!({"platform": "MetaTrader"}));
        });
        let listing = candidate.mock(|when, then| {
            when.method(GET)
                .path("/accounts")
                .query_param("user_id", "demo_user");
            then.status(200).json_body(json!({"accounts": []}));
        });

        let ctx = context_for(&current)?;
        handle_endpoint_set(
            &ctx,
            EndpointArgs {
                url: candidate.base_url(),
            },
        )
        .await
        .map_err(|err| anyhow!(err.display_message()))?;
        listing.assert();
        assert_eq!(
            ctx.session.endpoint().await.as_str(),
            candidate.base_url().as_str()
        );
        Ok(())
    }

    #[tokio::test]
    async fn endpoint_set_keeps_current_when_candidate_is_down() -> Result<()> {
        let current = MockServer::start_async().await;
        let candidate = MockServer::start_async().await;
        candidate.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(500).json_body(json!({"error": "maintenance"}));
        });

        let ctx = context_for(&current)?;
        let err = handle_endpoint_set(
            &ctx,
            EndpointArgs {
                url: candidate.base_url(),
            },
        )
        .await
        .expect_err("candidate offline");
        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().starts_with("Connection Failed"));
        assert_eq!(
            ctx.session.endpoint().await.as_str(),
            current.base_url().as_str()
        );
        Ok(())
    }

    #[test]
    fn presets_render_in_both_formats() -> Result<()> {
        let store = std::sync::Arc::new(tradedesk_test_support::mocks::ScriptedStore::new());
        for output in [OutputFormat::Table, OutputFormat::Json] {
            let ctx = AppContext::with_store(store.clone(), &ClientSettings::default(), output);
            handle_endpoint_presets(&ctx).map_err(|err| anyhow!(err.display_message()))?;
        }
        Ok(())
    }
}
