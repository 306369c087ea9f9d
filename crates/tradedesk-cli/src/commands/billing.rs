use tradedesk_core::BillingPeriod;
use tradedesk_sync::{Notice, PRICING_TIERS};

use crate::cli::{RedeemArgs, SubscribeArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_notice, render_pricing};

pub(crate) fn handle_pricing(ctx: &AppContext) -> CliResult<()> {
    render_pricing(&PRICING_TIERS, ctx.output)
}

pub(crate) async fn handle_subscribe(ctx: &AppContext, args: SubscribeArgs) -> CliResult<()> {
    let period = BillingPeriod::from(args.period);
    let subscription = ctx
        .session
        .subscribe(&args.tier, period)
        .await
        .map_err(|err| {
            let notice = Notice::subscription_failed(&err);
            CliError::from(err).noticed(&notice)
        })?;
    render_notice(&Notice::subscribed(&subscription), ctx.output)
}

pub(crate) async fn handle_redeem(ctx: &AppContext, args: RedeemArgs) -> CliResult<()> {
    let redemption = ctx.session.redeem(&args.code).await.map_err(|err| {
        let notice = Notice::redemption_failed(&err);
        CliError::from(err).noticed(&notice)
    })?;
    render_notice(&Notice::redeemed(&redemption), ctx.output)
}
