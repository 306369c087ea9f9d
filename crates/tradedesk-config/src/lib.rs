#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(missing_docs, unused, unreachable_pub)]

//! Client-side configuration for the TradeDesk workspace.
//!
//! Layout: `endpoint.rs` (normalized base URL of the remote account service),
//! `settings.rs` (environment-driven client settings), `defaults.rs`
//! (documented default values and variable names), `error.rs`.

pub mod defaults;
pub mod endpoint;
pub mod error;
pub mod settings;

pub use endpoint::{ENDPOINT_PRESETS, Endpoint, EndpointPreset};
pub use error::{ConfigError, ConfigResult};
pub use settings::{ClientSettings, LogFormatSetting};
