//! Start, stop and delete batches with per-service outcomes.
//!
//! # Design
//!
//! - Services are processed one at a time in catalog order so the operator's
//!   log reads top to bottom; each outcome is handed to the observer before
//!   the next request is sent.
//! - A failing service, whether the server refuses or never answers, is
//!   recorded and the batch moves on.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::catalog::{ServiceDescriptor, list_services};
use crate::client::{AdminClient, token_form};
use crate::error::AdminResult;
use crate::session::SessionToken;

/// Lifecycle operation applied to a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleOperation {
    /// Start the service.
    Start,
    /// Stop the service.
    Stop,
    /// Delete the service.
    Delete,
}

impl LifecycleOperation {
    /// Path segment understood by the admin endpoint.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Stop => "Stop",
            Self::Delete => "Delete",
        }
    }
}

impl Display for LifecycleOperation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Which services an operation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceTarget {
    /// Every service in a freshly discovered catalog.
    All,
    /// One named service.
    Service(ServiceDescriptor),
}

/// How one service's operation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The server answered `status: "success"`.
    Succeeded,
    /// The server answered with anything else.
    Rejected {
        /// Raw response body.
        body: String,
    },
    /// The request never produced a usable response.
    Transport {
        /// Error chain describing the failure.
        message: String,
    },
}

/// Result of applying one operation to one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationOutcome {
    /// Service the operation targeted.
    pub service: ServiceDescriptor,
    /// Operation that was requested.
    pub operation: LifecycleOperation,
    /// How it ended.
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl OperationOutcome {
    /// Whether the server confirmed the operation.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded)
    }

    /// Server body or transport description for a failed operation.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Succeeded => None,
            OutcomeStatus::Rejected { body } => Some(body),
            OutcomeStatus::Transport { message } => Some(message),
        }
    }
}

/// Success and failure counts of a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Services processed.
    pub total: usize,
    /// Services the server confirmed.
    pub succeeded: usize,
    /// Services that were refused or unreachable.
    pub failed: usize,
}

impl BatchSummary {
    /// Tally a list of outcomes.
    #[must_use]
    pub fn from_outcomes(outcomes: &[OperationOutcome]) -> Self {
        let succeeded = outcomes.iter().filter(|outcome| outcome.succeeded()).count();
        Self {
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
        }
    }
}

/// Apply `operation` to `target`, reporting every outcome to `observer` as
/// soon as it is known. Returns outcomes in the order services were resolved.
///
/// [`ServiceTarget::All`] re-discovers the catalog rather than reusing any
/// earlier snapshot.
///
/// # Errors
///
/// Only catalog discovery can fail the call; per-service failures are
/// recorded in the returned outcomes.
pub async fn apply<F>(
    client: &AdminClient,
    token: &SessionToken,
    operation: LifecycleOperation,
    target: ServiceTarget,
    mut observer: F,
) -> AdminResult<Vec<OperationOutcome>>
where
    F: FnMut(&OperationOutcome),
{
    let services = match target {
        ServiceTarget::All => list_services(client, token).await?,
        ServiceTarget::Service(service) => vec![service],
    };

    let mut outcomes = Vec::with_capacity(services.len());
    for service in services {
        let outcome = apply_one(client, token, operation, service).await;
        observer(&outcome);
        outcomes.push(outcome);
    }

    let summary = BatchSummary::from_outcomes(&outcomes);
    info!(
        operation = %operation,
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "lifecycle batch finished"
    );
    Ok(outcomes)
}

async fn apply_one(
    client: &AdminClient,
    token: &SessionToken,
    operation: LifecycleOperation,
    service: ServiceDescriptor,
) -> OperationOutcome {
    let path = service.operation_path(operation);
    let status = match client.post_raw(&path, &token_form(token)).await {
        Ok(body) => classify(body),
        Err(err) => OutcomeStatus::Transport {
            message: err.chain(),
        },
    };
    match &status {
        OutcomeStatus::Succeeded => {
            info!(service = %service, operation = %operation, "operation succeeded");
        }
        OutcomeStatus::Rejected { body } => {
            warn!(service = %service, operation = %operation, body = %body, "operation rejected");
        }
        OutcomeStatus::Transport { message } => {
            warn!(
                service = %service,
                operation = %operation,
                error = %message,
                "operation not delivered"
            );
        }
    }
    OperationOutcome {
        service,
        operation,
        status,
    }
}

fn classify(body: String) -> OutcomeStatus {
    let success = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| value.get("status").and_then(Value::as_str).map(str::to_owned))
        .is_some_and(|status| status == "success");
    if success {
        OutcomeStatus::Succeeded
    } else {
        OutcomeStatus::Rejected { body }
    }
}
