#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic)]

//! Session, catalog and orchestration client for a GIS server cluster's
//! administrative REST API.
//!
//! Layout:
//! - `config.rs`: endpoint and transport settings
//! - `client.rs`: HTTP transport shared by every admin call
//! - `session.rs`: token issuance and the lazy once-per-run guard
//! - `catalog.rs`: folder-aware service discovery
//! - `lifecycle.rs`: start/stop/delete batches with per-service outcomes
//! - `report.rs`: multi-call server report

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod report;
pub mod session;

pub use catalog::{
    RESERVED_FOLDERS, ROOT_FOLDER, ServiceDescriptor, ServiceStatus, list_services,
    service_status,
};
pub use client::AdminClient;
pub use config::AdminConfig;
pub use error::{AdminError, AdminResult};
pub use lifecycle::{
    BatchSummary, LifecycleOperation, OperationOutcome, OutcomeStatus, ServiceTarget, apply,
};
pub use report::{
    ClusterReport, Fragment, LicenseReport, MachineDetails, MachineReport, ServerReport,
    VersionInfo, build_report, expiration_date,
};
pub use session::{CredentialSource, Credentials, Session, SessionToken, StaticCredentials};
