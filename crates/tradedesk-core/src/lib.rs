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

//! Transport-agnostic trading account domain types and the remote store contract.
//!
//! Layout: `model/` (accounts, snapshots, billing DTOs), `error.rs` (remote,
//! fetch, write and validation failures), `service/` (the `AccountStore` trait
//! implemented by HTTP and in-memory adapters).

pub mod error;
pub mod model;
pub mod service;

pub use error::{
    FieldViolation, RemoteError, RemoteFetchError, RemoteResult, RemoteWriteError,
    ValidationError, WriteFailureKind,
};
pub use model::{
    AccountId, AccountSnapshot, BillingPeriod, HealthReport, NewAccount, OwnerId, Plan, Platform,
    PromoRedemption, Secret, SubscriptionReceipt, TradingAccount, default_nickname,
};
pub use service::AccountStore;
