//! Normalized base URL of the remote account service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::defaults::{DEFAULT_ENDPOINT, LOCALHOST_ENDPOINT};
use crate::error::{ConfigError, ConfigResult};

/// Base URL of the remote account service.
///
/// Values are trimmed and carry no trailing slash, so request paths are
/// appended with [`Endpoint::join`] as `base + "/path"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    /// Normalize and validate raw user input.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyEndpoint`] when the input is blank and
    /// [`ConfigError::InvalidEndpoint`] when it is not an absolute HTTP(S) URL.
    pub fn parse(raw: &str) -> ConfigResult<Self> {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }

        let parsed = Url::parse(&normalized).map_err(|err| ConfigError::InvalidEndpoint {
            value: normalized.clone(),
            reason: err.to_string(),
        })?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ConfigError::InvalidEndpoint {
                    value: normalized,
                    reason: format!("unsupported scheme '{other}'"),
                });
            }
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::InvalidEndpoint {
                value: normalized,
                reason: "missing host".to_string(),
            });
        }

        Ok(Self(normalized))
    }

    /// The local-development default endpoint.
    #[must_use]
    pub fn local_default() -> Self {
        Self(DEFAULT_ENDPOINT.to_string())
    }

    /// Borrow the normalized URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append an absolute request path (such as `/health`) to the base URL.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.0)
        } else {
            format!("{}/{path}", self.0)
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::local_default()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Endpoint {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for Endpoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_suffix('/').unwrap_or(trimmed).to_string()
}

/// Named endpoint suggestion offered to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointPreset {
    /// Short label shown next to the URL.
    pub label: &'static str,
    /// Base URL of the preset.
    pub url: &'static str,
    /// One-line description.
    pub description: &'static str,
}

/// Known local-development endpoints.
pub const ENDPOINT_PRESETS: &[EndpointPreset] = &[
    EndpointPreset {
        label: "Local Development",
        url: DEFAULT_ENDPOINT,
        description: "Flask server running locally",
    },
    EndpointPreset {
        label: "Localhost Alternative",
        url: LOCALHOST_ENDPOINT,
        description: "Alternative local address",
    },
];
