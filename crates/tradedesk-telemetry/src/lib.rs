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

//! Logging primitives shared across the TradeDesk workspace.
//!
//! Layout: `init.rs` (subscriber installation and format selection),
//! `context.rs` (process-level command span), `redact.rs` (masking of logins
//! and credentials before they reach a log line), `error.rs`.

pub mod context;
pub mod error;
pub mod init;
pub mod redact;

pub use context::GlobalContextGuard;
pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
pub use redact::{mask_login, redact_secret};
