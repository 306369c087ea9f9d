use tradedesk_sync::{Notice, SessionStatus};

use crate::client::{AppContext, CliError, CliResult};
use crate::output::{DashboardView, render_dashboard};

pub(crate) async fn handle_dashboard(ctx: &AppContext) -> CliResult<()> {
    let session = ctx.session.status().await;
    if session == SessionStatus::Authenticated {
        ctx.session.refresh().await.map_err(|err| {
            let notice = Notice::load_failed(&err);
            CliError::from(err).noticed(&notice)
        })?;
    }
    let connectivity = ctx.session.refresh_connectivity().await;
    let endpoint = ctx.session.endpoint().await;
    let view = DashboardView {
        session,
        endpoint: &endpoint,
        connectivity: &connectivity,
        stats: ctx.session.stats().await,
    };
    render_dashboard(&view, ctx.output)
}
