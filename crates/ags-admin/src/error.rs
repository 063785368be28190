//! Error types for admin API operations.
//!
//! # Design
//!
//! - Transport failures are kept apart from application-level rejections so an
//!   operator can tell an unreachable server from a refusing one.
//! - Per-service lifecycle failures are not errors at this level; they travel
//!   inside [`crate::lifecycle::OperationOutcome`] so a batch never aborts.

use std::error::Error as StdError;
use std::io;

use thiserror::Error;

/// Convenience alias for admin results.
pub type AdminResult<T> = Result<T, AdminError>;

/// Primary error type for admin API operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The server refused to issue a token or the reply carried none.
    #[error("authentication failed: {reason}")]
    Auth {
        /// Server messages or a short description of the missing field.
        reason: String,
    },
    /// A catalog response was malformed or carried an error payload.
    #[error("catalog discovery failed for '{folder}': {detail}")]
    Catalog {
        /// Folder whose listing failed (`/` for the root).
        folder: String,
        /// Server payload or parse description.
        detail: String,
    },
    /// A read-only admin call returned an error payload.
    #[error("admin call to '{endpoint}' was rejected: {body}")]
    Operation {
        /// Endpoint path relative to the admin root.
        endpoint: String,
        /// Raw server response body.
        body: String,
    },
    /// The request never produced a response.
    #[error("request to '{url}' failed")]
    Transport {
        /// Fully qualified request URL.
        url: String,
        /// Underlying HTTP client error.
        source: reqwest::Error,
    },
    /// The response body was not the JSON document expected.
    #[error("failed to decode response from '{endpoint}'")]
    Decode {
        /// Endpoint path relative to the admin root.
        endpoint: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// An endpoint path could not be joined onto the admin root.
    #[error("invalid admin URL for '{path}'")]
    InvalidUrl {
        /// Relative path that failed to resolve.
        path: String,
        /// Underlying URL parse error.
        source: url::ParseError,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    ClientBuild {
        /// Underlying HTTP client error.
        source: reqwest::Error,
    },
    /// Credentials could not be collected from the operator.
    #[error("failed to read credentials")]
    Credentials {
        /// Underlying IO error.
        source: io::Error,
    },
    /// A service path did not follow `folder/name.Type`.
    #[error("invalid service path '{value}': {reason}")]
    InvalidServicePath {
        /// Path supplied by the caller.
        value: String,
        /// Static reason for the failure.
        reason: &'static str,
    },
    /// Configuration failed validation.
    #[error("invalid configuration field '{field}': {reason}")]
    InvalidConfig {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
    },
}

impl AdminError {
    /// Returns `true` when the failure happened below the HTTP layer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::ClientBuild { .. })
    }

    /// Message followed by every underlying cause, joined with `: `.
    #[must_use]
    pub fn chain(&self) -> String {
        let mut message = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}
