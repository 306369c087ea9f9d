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

//! HTTP adapter for the remote account service.
//!
//! Layout: `store.rs` (the `AccountStore` implementation over `reqwest`),
//! `wire.rs` (request and response bodies, lenient row decoding), `error.rs`.

pub mod error;
pub mod store;
mod wire;

pub use error::{ClientError, ClientResult};
pub use store::{HEADER_REQUEST_ID, HttpAccountStore};
