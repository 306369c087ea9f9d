//! Validation and submission of new trading accounts.

use std::sync::Arc;

use tracing::{info, warn};
use tradedesk_core::{
    AccountStore, NewAccount, OwnerId, Plan, Platform, RemoteWriteError, Secret, TradingAccount,
    ValidationError, default_nickname,
};
use tradedesk_telemetry::mask_login;

use crate::endpoint::EndpointStore;
use crate::error::FlowError;

/// Platform choice that switches to the free-text platform name.
pub const OTHER_PLATFORM: &str = "Other";

const GENERIC_FAILURE: &str = "Registration failed";

/// Raw registration input as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    /// Recognized platform label, or `Other`.
    pub platform: String,
    /// Platform name used when `platform` is `Other`.
    pub custom_platform: String,
    /// Account login or number.
    pub login: String,
    /// Account credential.
    pub secret: Secret,
    /// Broker server or connection string.
    pub server: String,
    /// Plan name; empty means `Basic`.
    pub plan: String,
    /// Optional nickname; empty means derived from the platform.
    pub nickname: String,
}

impl RegistrationForm {
    /// Check every field and build the payload for `identity`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing every failing field.
    pub fn validate(&self, identity: Option<&OwnerId>) -> Result<NewAccount, ValidationError> {
        let mut violations = ValidationError::default();

        if identity.is_none() {
            violations.push("owner", "sign in to register trading accounts");
        }
        let platform = self.resolve_platform(&mut violations);
        let login = self.login.trim();
        if login.is_empty() {
            violations.push("login", "is required");
        }
        if self.secret.is_blank() {
            violations.push("secret", "is required");
        }
        let server = self.server.trim();
        if server.is_empty() {
            violations.push("server", "is required");
        }
        let plan = if self.plan.trim().is_empty() {
            Some(Plan::default())
        } else {
            let plan = Plan::from_input(&self.plan);
            if plan.is_none() {
                violations.push("plan", "must be one of Basic, Premium, Pro");
            }
            plan
        };

        match (identity, platform, plan) {
            (Some(owner), Some(platform), Some(plan)) if violations.is_empty() => {
                let nickname = match self.nickname.trim() {
                    "" => default_nickname(&platform),
                    given => given.to_string(),
                };
                Ok(NewAccount {
                    owner_id: owner.clone(),
                    platform,
                    login: login.to_string(),
                    secret: self.secret.clone(),
                    server: server.to_string(),
                    plan,
                    nickname,
                })
            }
            _ => Err(violations),
        }
    }

    fn resolve_platform(&self, violations: &mut ValidationError) -> Option<Platform> {
        let choice = self.platform.trim();
        if choice.is_empty() {
            violations.push("platform", "is required");
            return None;
        }
        if choice.eq_ignore_ascii_case(OTHER_PLATFORM) {
            let custom = self.custom_platform.trim();
            if custom.is_empty() {
                violations.push("platform", "custom platform name is required");
                return None;
            }
            return Some(
                Platform::from_label(custom).unwrap_or_else(|| Platform::Other(custom.to_string())),
            );
        }
        let platform = Platform::from_label(choice);
        if platform.is_none() {
            violations.push("platform", "is not a recognized platform");
        }
        platform
    }
}

/// Acknowledgement of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationReceipt {
    /// Payload that was submitted, with the derived nickname.
    pub submitted: NewAccount,
    /// Stored record when the remote store echoed one.
    pub echoed: Option<TradingAccount>,
}

/// Submits new accounts; never touches the directory snapshot.
pub struct RegistrationFlow {
    store: Arc<dyn AccountStore>,
    endpoints: Arc<EndpointStore>,
}

impl RegistrationFlow {
    /// Flow writing through `store` at the endpoint held by `endpoints`.
    #[must_use]
    pub fn new(store: Arc<dyn AccountStore>, endpoints: Arc<EndpointStore>) -> Self {
        Self { store, endpoints }
    }

    /// Validate `form` and submit it for `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Validation`] without any remote call when a field
    /// fails, and [`FlowError::Remote`] when the store rejects the write. The
    /// form is only borrowed, so it can be resubmitted unchanged.
    pub async fn register(
        &self,
        identity: Option<&OwnerId>,
        form: &RegistrationForm,
    ) -> Result<RegistrationReceipt, FlowError> {
        let submitted = form.validate(identity)?;
        let endpoint = self.endpoints.endpoint().await;

        match self.store.register_account(&endpoint, &submitted).await {
            Ok(echoed) => {
                info!(
                    login = %mask_login(&submitted.login),
                    platform = %submitted.platform,
                    echoed = echoed.is_some(),
                    "trading account registered"
                );
                Ok(RegistrationReceipt { submitted, echoed })
            }
            Err(err) => {
                let failure = RemoteWriteError::from_remote(&err, GENERIC_FAILURE);
                warn!(
                    login = %mask_login(&submitted.login),
                    kind = %failure.kind,
                    error = %err,
                    "trading account registration failed"
                );
                Err(failure.into())
            }
        }
    }
}
