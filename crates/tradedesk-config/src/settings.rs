//! Environment-driven client settings.

use std::str::FromStr;
use std::time::Duration;

use crate::defaults::{
    DEFAULT_LOG_LEVEL, DEFAULT_TIMEOUT_SECS, ENV_API_URL, ENV_HTTP_TIMEOUT_SECS, ENV_LOG_FORMAT,
    ENV_LOG_LEVEL, ENV_USER_ID,
};
use crate::endpoint::Endpoint;
use crate::error::{ConfigError, ConfigResult};

/// Requested log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormatSetting {
    /// Pick based on build profile.
    #[default]
    Auto,
    /// Structured JSON lines.
    Json,
    /// Human-friendly multi-line output.
    Pretty,
}

impl LogFormatSetting {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }
}

impl FromStr for LogFormatSetting {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(ConfigError::InvalidField {
                field: ENV_LOG_FORMAT,
                value: Some(value.to_string()),
                reason: "expected one of auto, json, pretty",
            }),
        }
    }
}

/// Settings shared by every client entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Initial endpoint of the remote service.
    pub endpoint: Endpoint,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
    /// Authenticated user identifier, absent when not signed in.
    pub user_id: Option<String>,
    /// Tracing level directive.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormatSetting,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_id: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormatSetting::Auto,
        }
    }
}

impl ClientSettings {
    /// Load settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a present variable holds an invalid value.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an injectable lookup, falling back to defaults
    /// for unset or blank variables.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a present variable holds an invalid value.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut settings = Self::default();

        if let Some(raw) = read(ENV_API_URL) {
            settings.endpoint = Endpoint::parse(&raw)?;
        }
        if let Some(raw) = read(ENV_HTTP_TIMEOUT_SECS) {
            let secs = raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::InvalidField {
                    field: ENV_HTTP_TIMEOUT_SECS,
                    value: Some(raw.clone()),
                    reason: "expected a positive integer number of seconds",
                })?;
            settings.http_timeout = Duration::from_secs(secs);
        }
        settings.user_id = read(ENV_USER_ID);
        if let Some(level) = read(ENV_LOG_LEVEL) {
            settings.log_level = level;
        }
        if let Some(raw) = read(ENV_LOG_FORMAT) {
            settings.log_format = raw.parse()?;
        }

        Ok(settings)
    }
}
