//! Default values and environment variable names for client configuration.
//!
//! # Design
//! - Centralize defaults so the CLI, the sync core and tests agree.
//! - Keep the local-development address explicit; it is the documented initial endpoint.

/// Base URL used when nothing else is configured (local Flask development server).
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000";
/// Alternative loopback address offered as a preset.
pub const LOCALHOST_ENDPOINT: &str = "http://localhost:5000";
/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default tracing level when neither `RUST_LOG` nor configuration override it.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable holding the remote service base URL.
pub const ENV_API_URL: &str = "TRADEDESK_API_URL";
/// Environment variable holding the HTTP timeout in seconds.
pub const ENV_HTTP_TIMEOUT_SECS: &str = "TRADEDESK_HTTP_TIMEOUT_SECS";
/// Environment variable holding the authenticated user identifier.
pub const ENV_USER_ID: &str = "TRADEDESK_USER_ID";
/// Environment variable holding the tracing level.
pub const ENV_LOG_LEVEL: &str = "TRADEDESK_LOG_LEVEL";
/// Environment variable selecting `json` or `pretty` log output.
pub const ENV_LOG_FORMAT: &str = "TRADEDESK_LOG_FORMAT";
