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

//! Client-side account state synchronisation.
//!
//! Layout:
//! - `endpoint.rs` / `connectivity.rs`: committed base URL and its liveness signal.
//! - `directory.rs`: authoritative snapshot of the current identity's accounts.
//! - `registration.rs`, `deletion.rs`, `billing.rs`: write flows against the remote store.
//! - `dashboard.rs`: pure statistics over a snapshot.
//! - `notice.rs`: user-facing outcome messages.
//! - `session.rs`: façade wiring identity changes and writes to directory refreshes.

pub mod billing;
pub mod connectivity;
pub mod dashboard;
pub mod deletion;
pub mod directory;
pub mod endpoint;
pub mod error;
pub mod notice;
pub mod registration;
pub mod session;

pub use billing::{BillingFlow, PRICING_TIERS, PricingTier, Subscription, pricing_tier};
pub use connectivity::{Connectivity, ProbeOutcome, probe};
pub use dashboard::{DashboardStats, SessionStatus, aggregate};
pub use deletion::{DeletionFlow, DeletionOutcome};
pub use directory::{AccountDirectory, RefreshOutcome};
pub use endpoint::{EndpointCommit, EndpointStore};
pub use error::{EndpointError, FlowError};
pub use notice::{Notice, NoticeLevel};
pub use registration::{RegistrationFlow, RegistrationForm, RegistrationReceipt};
pub use session::{Session, Synced};
