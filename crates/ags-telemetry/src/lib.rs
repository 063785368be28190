#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic)]

//! Logging setup shared by the console binaries.
//!
//! Diagnostics go to stderr through `tracing`; stdout is left to the
//! operator-facing output of whichever binary installs the subscriber.

pub mod init;

pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_version, init_logging};
