//! Subscription and promo-code flows plus the offered pricing tiers.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use tradedesk_core::{
    AccountStore, BillingPeriod, OwnerId, PromoRedemption, RemoteWriteError, SubscriptionReceipt,
    ValidationError,
};

use crate::endpoint::EndpointStore;
use crate::error::FlowError;

const SUBSCRIBE_FAILURE: &str = "Subscription failed";
const REDEEM_FAILURE: &str = "Invalid promo code";

/// One offered subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PricingTier {
    /// Stable identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Price in US dollars per month.
    pub monthly_price_usd: u32,
    /// Audience summary.
    pub description: &'static str,
    /// Whether the tier is highlighted as the most popular.
    pub popular: bool,
    /// Included features.
    pub features: &'static [&'static str],
}

/// Tiers offered to subscribers.
pub const PRICING_TIERS: [PricingTier; 3] = [
    PricingTier {
        id: "basic",
        name: "Basic",
        monthly_price_usd: 29,
        description: "Perfect for individual traders",
        popular: false,
        features: &[
            "Up to 3 trading accounts",
            "Basic webhook integration",
            "MT5/MT4 support",
            "Email support",
            "Basic analytics",
            "Standard execution speed",
        ],
    },
    PricingTier {
        id: "pro",
        name: "Professional",
        monthly_price_usd: 79,
        description: "For serious traders and small teams",
        popular: true,
        features: &[
            "Unlimited trading accounts",
            "Advanced webhook features",
            "Priority execution",
            "24/7 priority support",
            "Advanced analytics & reports",
            "Risk management tools",
            "Custom magic numbers",
            "Multi-broker support",
        ],
    },
    PricingTier {
        id: "enterprise",
        name: "Enterprise",
        monthly_price_usd: 199,
        description: "For trading firms and institutions",
        popular: false,
        features: &[
            "Everything in Professional",
            "Dedicated account manager",
            "Custom integrations",
            "White-label options",
            "SLA guarantees",
            "Advanced security features",
            "API access",
            "Custom reporting",
        ],
    },
];

/// Look up an offered tier by its identifier, ignoring case and surrounding whitespace.
#[must_use]
pub fn pricing_tier(id: &str) -> Option<&'static PricingTier> {
    let id = id.trim();
    PRICING_TIERS
        .iter()
        .find(|tier| tier.id.eq_ignore_ascii_case(id))
}

/// An activated subscription together with the tier it was taken out on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscription {
    /// Tier the subscriber chose.
    pub tier: &'static PricingTier,
    /// Billing period sent to the server.
    pub period: BillingPeriod,
    /// Server confirmation.
    #[serde(flatten)]
    pub receipt: SubscriptionReceipt,
}

/// Subscribe and redeem calls against the remote billing endpoints.
pub struct BillingFlow {
    store: Arc<dyn AccountStore>,
    endpoints: Arc<EndpointStore>,
}

impl BillingFlow {
    /// Flow writing through `store` at the endpoint held by `endpoints`.
    #[must_use]
    pub fn new(store: Arc<dyn AccountStore>, endpoints: Arc<EndpointStore>) -> Self {
        Self { store, endpoints }
    }

    /// Activate the `tier_id` tier billed every `period`.
    ///
    /// Only the period goes over the wire; the tier names the plan in the
    /// resulting [`Subscription`].
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Validation`] when no identity is present or the
    /// tier is not offered (nothing is sent) and [`FlowError::Remote`] when
    /// the store refuses the subscription.
    pub async fn subscribe(
        &self,
        identity: Option<&OwnerId>,
        tier_id: &str,
        period: BillingPeriod,
    ) -> Result<Subscription, FlowError> {
        let tier = pricing_tier(tier_id);
        let mut violations = ValidationError::default();
        if identity.is_none() {
            violations.push("owner", "sign in to subscribe");
        }
        if tier.is_none() {
            violations.push("tier", format!("unknown pricing tier '{}'", tier_id.trim()));
        }
        let (Some(owner), Some(tier)) = (identity, tier) else {
            return Err(violations.into());
        };

        let endpoint = self.endpoints.endpoint().await;
        self.store
            .subscribe(&endpoint, owner, period)
            .await
            .map(|receipt| {
                info!(
                    tier = tier.id,
                    period = period.as_str(),
                    active_until = %receipt.active_until,
                    "subscription active"
                );
                Subscription {
                    tier,
                    period,
                    receipt,
                }
            })
            .map_err(|err| {
                let failure = RemoteWriteError::from_remote(&err, SUBSCRIBE_FAILURE);
                warn!(tier = tier.id, period = period.as_str(), error = %err, "subscription failed");
                FlowError::Remote(failure)
            })
    }

    /// Redeem a promo code.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Validation`] for a blank code or absent identity
    /// (nothing is sent) and [`FlowError::Remote`] when the store rejects it.
    pub async fn redeem(
        &self,
        identity: Option<&OwnerId>,
        code: &str,
    ) -> Result<PromoRedemption, FlowError> {
        let code = code.trim();
        let mut violations = ValidationError::default();
        if identity.is_none() {
            violations.push("owner", "sign in to redeem promo codes");
        }
        if code.is_empty() {
            violations.push("code", "please enter a promo code");
        }
        let Some(owner) = identity.filter(|_| violations.is_empty()) else {
            return Err(violations.into());
        };

        let endpoint = self.endpoints.endpoint().await;
        self.store
            .redeem(&endpoint, owner, code)
            .await
            .inspect(|redemption| {
                info!(
                    discount_percent = redemption.discount_percent,
                    days = redemption.days,
                    "promo code redeemed"
                );
            })
            .map_err(|err| {
                warn!(error = %err, "promo code redemption failed");
                FlowError::Remote(RemoteWriteError::from_remote(&err, REDEEM_FAILURE))
            })
    }
}
