#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic)]

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (canned admin-server documents mounted on a mock server).

pub mod fixtures;
